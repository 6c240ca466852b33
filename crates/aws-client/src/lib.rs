//! AWS service clients for the managed-resource controllers
//!
//! Thin, typed wrappers over the AWS SDK for the four services the controllers
//! reconcile: API Gateway v2, ECS, DAX and SageMaker. Each service is described
//! by a trait so controllers can run against [`MockAwsClient`] in tests.
//!
//! # Example
//!
//! ```no_run
//! use aws_client::{AwsClients, ApiGatewayV2Api};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let clients = AwsClients::for_region("us-east-1").await;
//!
//! match clients.apigatewayv2.get_api("a1b2c3").await {
//!     Ok(api) => println!("{} is served at {:?}", api.name, api.api_endpoint),
//!     Err(e) if e.is_code("NotFoundException") => println!("no such API"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Service errors**: every failure carries the AWS error code, so callers can
//!   classify not-found and throttling without matching on SDK types
//! - **Pagination**: list operations follow `NextToken` until exhausted
//! - **Mocking**: the `test-util` feature enables an in-memory [`MockAwsClient`]

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod aws_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use aws_trait::{ApiGatewayV2Api, DaxApi, EcsApi, SageMakerApi};
pub use client::{ApiGatewayV2Client, AwsClients, DaxClient, EcsClient, SageMakerClient, load_config};
pub use error::AwsError;
pub use models::Tag;
#[cfg(feature = "test-util")]
pub use mock::MockAwsClient;
