//! Reference resolver
//!
//! A reference site is a value field in `spec.forProvider` together with the
//! by-name reference and the label selector that can fill it. Each kind
//! declares its sites as data ([`ReferenceSite`]) and [`resolve_references`]
//! walks them before every observe:
//!
//! 1. a value that is already set is left alone;
//! 2. otherwise a by-name reference fetches the target record and runs the
//!    site's extractor on it;
//! 3. otherwise the selector lists targets in the record's namespace, keeps
//!    those carrying all `matchLabels`, picks the lowest name, records that
//!    choice in the by-name reference and extracts.
//!
//! Multi-valued sites resolve explicit references in order, then append
//! selector matches sorted by name and de-duplicated against them.
//! Sites are independent of each other and resolution never recurses.

use std::fmt;

use async_trait::async_trait;
use crds::{Managed, Reference, Selector, external_name};
use kube::api::{Api, ListParams};
use kube::core::{ApiResource, DynamicObject, TypeMeta};
use kube::{Client, Resource, ResourceExt};

use crate::error::ControllerError;

/// Read access to the records that references point at
#[async_trait]
pub trait Reader: Send + Sync {
    /// Fetch one record, `None` when it does not exist
    async fn get(&self, target: &ApiResource, namespace: &str, name: &str) -> Result<Option<DynamicObject>, ControllerError>;

    /// List every record of the target kind in a namespace
    async fn list(&self, target: &ApiResource, namespace: &str) -> Result<Vec<DynamicObject>, ControllerError>;
}

/// [`Reader`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeReader {
    client: Client,
}

impl KubeReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl fmt::Debug for KubeReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeReader").finish_non_exhaustive()
    }
}

#[async_trait]
impl Reader for KubeReader {
    async fn get(&self, target: &ApiResource, namespace: &str, name: &str) -> Result<Option<DynamicObject>, ControllerError> {
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, target);
        Ok(api.get_opt(name).await?)
    }

    async fn list(&self, target: &ApiResource, namespace: &str) -> Result<Vec<DynamicObject>, ControllerError> {
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, target);
        Ok(api.list(&ListParams::default()).await?.items)
    }
}

type Extractor = Box<dyn Fn(DynamicObject) -> Result<Option<String>, ControllerError> + Send + Sync>;

enum Arity<P> {
    Single {
        value: fn(&mut P) -> &mut Option<String>,
        reference: fn(&mut P) -> &mut Option<Reference>,
        selector: fn(&P) -> Option<&Selector>,
    },
    Multi {
        values: fn(&mut P) -> &mut Vec<String>,
        references: fn(&mut P) -> &mut Vec<Reference>,
        selector: fn(&P) -> Option<&Selector>,
    },
}

/// One reference site of a parameters type `P`
pub struct ReferenceSite<P> {
    field: &'static str,
    target: ApiResource,
    arity: Arity<P>,
    extract: Extractor,
}

impl<P> fmt::Debug for ReferenceSite<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSite")
            .field("field", &self.field)
            .field("target", &self.target.kind)
            .finish_non_exhaustive()
    }
}

impl<P> ReferenceSite<P> {
    /// A single-valued site targeting records of kind `T`
    pub fn single<T: Managed>(
        field: &'static str,
        value: fn(&mut P) -> &mut Option<String>,
        reference: fn(&mut P) -> &mut Option<Reference>,
        selector: fn(&P) -> Option<&Selector>,
        extractor: fn(&T) -> Option<String>,
    ) -> Self {
        Self {
            field,
            target: ApiResource::erase::<T>(&()),
            arity: Arity::Single {
                value,
                reference,
                selector,
            },
            extract: typed_extractor(extractor),
        }
    }

    /// A multi-valued site targeting records of kind `T`
    pub fn multi<T: Managed>(
        field: &'static str,
        values: fn(&mut P) -> &mut Vec<String>,
        references: fn(&mut P) -> &mut Vec<Reference>,
        selector: fn(&P) -> Option<&Selector>,
        extractor: fn(&T) -> Option<String>,
    ) -> Self {
        Self {
            field,
            target: ApiResource::erase::<T>(&()),
            arity: Arity::Multi {
                values,
                references,
                selector,
            },
            extract: typed_extractor(extractor),
        }
    }

    /// Field path of the site's value, used in error messages
    pub fn path(&self) -> String {
        format!("spec.forProvider.{}", self.field)
    }
}

fn typed_extractor<T: Managed>(extractor: fn(&T) -> Option<String>) -> Extractor {
    Box::new(move |mut obj: DynamicObject| {
        // List items may come back without apiVersion/kind
        obj.types.get_or_insert_with(|| TypeMeta {
            api_version: T::api_version(&()).to_string(),
            kind: T::kind(&()).to_string(),
        });
        let typed: T = serde_json::from_value(serde_json::to_value(&obj)?)?;
        Ok(extractor(&typed).filter(|value| !value.is_empty()))
    })
}

/// Extractor returning the external name of the target
pub fn external_name_of<T: Resource>(obj: &T) -> Option<String> {
    Some(external_name(obj)).filter(|name| !name.is_empty())
}

impl<P: Send + Sync> ReferenceSite<P> {
    async fn resolve(&self, reader: &dyn Reader, namespace: &str, params: &mut P) -> Result<(), ControllerError> {
        match self.arity {
            Arity::Single {
                value,
                reference,
                selector,
            } => {
                if value(params).as_deref().is_some_and(|v| !v.is_empty()) {
                    return Ok(());
                }
                if let Some(by_name) = reference(params).clone() {
                    let resolved = self.fetch(reader, namespace, &by_name.name).await?;
                    *value(params) = Some(resolved);
                    return Ok(());
                }
                let Some(selector) = selector(params).cloned() else {
                    return Ok(());
                };
                let candidates = self.select(reader, namespace, &selector).await?;
                let Some(first) = candidates.into_iter().next() else {
                    return Err(ControllerError::Reference(format!(
                        "{}: no {} matches the selector",
                        self.path(),
                        self.target.kind
                    )));
                };
                let name = first.name_any();
                let resolved = self.extract_from(first, &name)?;
                *reference(params) = Some(Reference::new(name));
                *value(params) = Some(resolved);
                Ok(())
            }
            Arity::Multi {
                values,
                references,
                selector,
            } => {
                if !values(params).is_empty() {
                    return Ok(());
                }
                let mut refs = references(params).clone();
                let selector = selector(params).cloned();
                if refs.is_empty() && selector.is_none() {
                    return Ok(());
                }

                let mut resolved = Vec::with_capacity(refs.len());
                for by_name in &refs {
                    resolved.push(self.fetch(reader, namespace, &by_name.name).await?);
                }
                if let Some(selector) = selector {
                    for candidate in self.select(reader, namespace, &selector).await? {
                        let name = candidate.name_any();
                        if refs.iter().any(|r| r.name == name) {
                            continue;
                        }
                        resolved.push(self.extract_from(candidate, &name)?);
                        refs.push(Reference::new(name));
                    }
                }

                *references(params) = refs;
                *values(params) = resolved;
                Ok(())
            }
        }
    }

    async fn fetch(&self, reader: &dyn Reader, namespace: &str, name: &str) -> Result<String, ControllerError> {
        let obj = reader.get(&self.target, namespace, name).await?.ok_or_else(|| {
            ControllerError::Reference(format!(
                "{}: referenced {} {}/{} not found",
                self.path(),
                self.target.kind,
                namespace,
                name
            ))
        })?;
        self.extract_from(obj, name)
    }

    /// Selector matches sorted by name
    async fn select(&self, reader: &dyn Reader, namespace: &str, selector: &Selector) -> Result<Vec<DynamicObject>, ControllerError> {
        let mut matches: Vec<DynamicObject> = reader
            .list(&self.target, namespace)
            .await?
            .into_iter()
            .filter(|obj| selector.matches(obj.metadata.labels.as_ref()))
            .collect();
        matches.sort_by_key(|obj| obj.name_any());
        Ok(matches)
    }

    fn extract_from(&self, obj: DynamicObject, name: &str) -> Result<String, ControllerError> {
        (self.extract)(obj)?.ok_or_else(|| {
            ControllerError::Reference(format!(
                "{}: referenced {} {} has no value yet",
                self.path(),
                self.target.kind,
                name
            ))
        })
    }
}

/// Resolve every site of `params`; reports whether any field changed
///
/// Either all sites resolve and `params` is updated, or `params` is left untouched.
pub async fn resolve_references<P>(
    reader: &dyn Reader,
    namespace: &str,
    params: &mut P,
    sites: &[ReferenceSite<P>],
) -> Result<bool, ControllerError>
where
    P: Clone + PartialEq + Send + Sync,
{
    if sites.is_empty() {
        return Ok(false);
    }
    let mut resolved = params.clone();
    for site in sites {
        site.resolve(reader, namespace, &mut resolved).await?;
    }
    let changed = resolved != *params;
    *params = resolved;
    Ok(changed)
}

/// In-memory [`Reader`] for tests
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    objects: Vec<DynamicObject>,
}

#[cfg(test)]
impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record; it must carry a namespace
    pub fn insert<K: Managed>(&mut self, obj: &K) {
        let mut dynamic: DynamicObject = serde_json::from_value(serde_json::to_value(obj).unwrap()).unwrap();
        dynamic.types = Some(TypeMeta {
            api_version: K::api_version(&()).to_string(),
            kind: K::kind(&()).to_string(),
        });
        self.objects.push(dynamic);
    }

    /// Builder form of [`MemoryReader::insert`]
    pub fn with<K: Managed>(mut self, obj: &K) -> Self {
        self.insert(obj);
        self
    }

    fn matching<'a>(&'a self, target: &'a ApiResource, namespace: &'a str) -> impl Iterator<Item = &'a DynamicObject> {
        self.objects.iter().filter(move |obj| {
            obj.types
                .as_ref()
                .is_some_and(|t| t.api_version == target.api_version && t.kind == target.kind)
                && obj.metadata.namespace.as_deref() == Some(namespace)
        })
    }
}

#[cfg(test)]
#[async_trait]
impl Reader for MemoryReader {
    async fn get(&self, target: &ApiResource, namespace: &str, name: &str) -> Result<Option<DynamicObject>, ControllerError> {
        Ok(self.matching(target, namespace).find(|obj| obj.name_any() == name).cloned())
    }

    async fn list(&self, target: &ApiResource, namespace: &str) -> Result<Vec<DynamicObject>, ControllerError> {
        Ok(self.matching(target, namespace).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{api, in_namespace, labeled};
    use crds::apigatewayv2::{Api, StageParameters};
    use crds::set_external_name;

    fn api_id_site() -> ReferenceSite<StageParameters> {
        ReferenceSite::single::<Api>(
            "apiId",
            |p| &mut p.api_id,
            |p| &mut p.api_id_ref,
            |p| p.api_id_selector.as_ref(),
            external_name_of,
        )
    }

    fn named_api(name: &str, id: &str, labels: &[(&str, &str)]) -> Api {
        let mut api = labeled(in_namespace(api(name), "default"), labels);
        set_external_name(&mut api, id);
        api
    }

    #[tokio::test]
    async fn test_set_value_is_kept() {
        let reader = MemoryReader::new().with(&named_api("other", "zzz", &[]));
        let mut params = StageParameters {
            api_id: Some("abc123".to_string()),
            api_id_ref: Some(Reference::new("other")),
            ..Default::default()
        };
        let changed = resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.unwrap();
        assert!(!changed);
        assert_eq!(params.api_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_resolves_by_name() {
        let reader = MemoryReader::new().with(&named_api("my-api", "abc123", &[]));
        let mut params = StageParameters {
            api_id_ref: Some(Reference::new("my-api")),
            ..Default::default()
        };
        let changed = resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.unwrap();
        assert!(changed);
        assert_eq!(params.api_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_missing_target_names_the_field() {
        let reader = MemoryReader::new();
        let mut params = StageParameters {
            api_id_ref: Some(Reference::new("absent")),
            ..Default::default()
        };
        let err = resolve_references(&reader, "default", &mut params, &[api_id_site()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("spec.forProvider.apiId"), "{err}");
        assert_eq!(params.api_id, None);
    }

    #[tokio::test]
    async fn test_target_without_external_name_is_an_error() {
        let reader = MemoryReader::new().with(&in_namespace(api("pending"), "default"));
        let mut params = StageParameters {
            api_id_ref: Some(Reference::new("pending")),
            ..Default::default()
        };
        let err = resolve_references(&reader, "default", &mut params, &[api_id_site()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("has no value yet"), "{err}");
    }

    #[tokio::test]
    async fn test_other_namespaces_are_invisible() {
        let mut elsewhere = named_api("my-api", "abc123", &[]);
        elsewhere.metadata.namespace = Some("other".to_string());
        let reader = MemoryReader::new().with(&elsewhere);
        let mut params = StageParameters {
            api_id_ref: Some(Reference::new("my-api")),
            ..Default::default()
        };
        assert!(resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.is_err());
    }

    #[tokio::test]
    async fn test_selector_picks_lowest_name_and_records_it() {
        let reader = MemoryReader::new()
            .with(&named_api("b-api", "bbb", &[("team", "web")]))
            .with(&named_api("a-api", "aaa", &[("team", "web")]))
            .with(&named_api("0-api", "000", &[("team", "ops")]));
        let mut params = StageParameters {
            api_id_selector: Some(Selector::with_labels([("team", "web")])),
            ..Default::default()
        };
        resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.unwrap();
        assert_eq!(params.api_id.as_deref(), Some("aaa"));
        assert_eq!(params.api_id_ref, Some(Reference::new("a-api")));
    }

    #[tokio::test]
    async fn test_selector_without_match_fails() {
        let reader = MemoryReader::new().with(&named_api("a-api", "aaa", &[("team", "web")]));
        let mut params = StageParameters {
            api_id_selector: Some(Selector::with_labels([("team", "data")])),
            ..Default::default()
        };
        assert!(resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.is_err());
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let reader = MemoryReader::new().with(&named_api("a-api", "aaa", &[("team", "web")]));
        let mut params = StageParameters {
            api_id_selector: Some(Selector::with_labels([("team", "web")])),
            ..Default::default()
        };
        assert!(resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.unwrap());
        let first = params.clone();
        assert!(!resolve_references(&reader, "default", &mut params, &[api_id_site()]).await.unwrap());
        assert_eq!(params, first);
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct ApiSet {
        api_ids: Vec<String>,
        api_id_refs: Vec<Reference>,
        api_id_selector: Option<Selector>,
    }

    fn api_ids_site() -> ReferenceSite<ApiSet> {
        ReferenceSite::multi::<Api>(
            "apiIds",
            |p| &mut p.api_ids,
            |p| &mut p.api_id_refs,
            |p| p.api_id_selector.as_ref(),
            external_name_of,
        )
    }

    #[tokio::test]
    async fn test_multi_keeps_explicit_order_then_appends_selected() {
        let reader = MemoryReader::new()
            .with(&named_api("z-api", "zzz", &[("team", "web")]))
            .with(&named_api("c-api", "ccc", &[("team", "web")]))
            .with(&named_api("b-api", "bbb", &[("team", "web")]))
            .with(&named_api("a-api", "aaa", &[]));
        let mut params = ApiSet {
            api_id_refs: vec![Reference::new("z-api"), Reference::new("a-api")],
            api_id_selector: Some(Selector::with_labels([("team", "web")])),
            ..Default::default()
        };
        resolve_references(&reader, "default", &mut params, &[api_ids_site()]).await.unwrap();
        assert_eq!(params.api_ids, vec!["zzz", "aaa", "bbb", "ccc"]);
        let names: Vec<&str> = params.api_id_refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["z-api", "a-api", "b-api", "c-api"]);

        // Second pass leaves everything alone
        let first = params.clone();
        assert!(!resolve_references(&reader, "default", &mut params, &[api_ids_site()]).await.unwrap());
        assert_eq!(params, first);
    }

    #[tokio::test]
    async fn test_failure_leaves_params_untouched() {
        let reader = MemoryReader::new().with(&named_api("a-api", "aaa", &[]));
        let mut params = ApiSet {
            api_id_refs: vec![Reference::new("a-api"), Reference::new("missing")],
            ..Default::default()
        };
        assert!(resolve_references(&reader, "default", &mut params, &[api_ids_site()]).await.is_err());
        assert!(params.api_ids.is_empty());
    }
}
