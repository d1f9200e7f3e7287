use crate::domain::{Application, Authentication, Endpoint, ResourceType};
use crate::sources_api::{ApiError, SourcesApi};

/// Endpoint and application found for a source; either may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedResources {
    pub endpoint: Option<Endpoint>,
    pub application: Option<Application>,
}

/// Looks up the records a check needs through the Sources API.
///
/// A lookup failure is logged and reported as an absent record so the check still reaches
/// a status for the source.
pub struct ResourceAccessor<'a> {
    api: &'a dyn SourcesApi,
}

impl<'a> ResourceAccessor<'a> {
    pub fn new(api: &'a dyn SourcesApi) -> Self {
        Self { api }
    }

    pub async fn resolve(&self, source_id: &str) -> ResolvedResources {
        let endpoint = absent_on_error(
            source_id,
            ResourceType::Endpoint,
            self.api.get_endpoint(source_id).await,
        );
        let application = absent_on_error(
            source_id,
            ResourceType::Application,
            self.api.get_application(source_id).await,
        );

        ResolvedResources {
            endpoint,
            application,
        }
    }

    pub async fn authentication(
        &self,
        source_id: &str,
        endpoint: &Endpoint,
    ) -> Option<Authentication> {
        match self.api.get_authentication(&endpoint.id).await {
            Ok(authentication) => authentication,
            Err(err) => {
                crate::availability_event!(
                    warn,
                    "availability_check.lookup_failed",
                    source = source_id,
                    resource = "Authentication",
                    endpoint_id = endpoint.id,
                    error = err,
                );
                None
            }
        }
    }
}

fn absent_on_error<T>(
    source_id: &str,
    resource: ResourceType,
    result: Result<Option<T>, ApiError>,
) -> Option<T> {
    match result {
        Ok(record) => record,
        Err(err) => {
            crate::availability_event!(
                warn,
                "availability_check.lookup_failed",
                source = source_id,
                resource = resource,
                error = err,
            );
            None
        }
    }
}
