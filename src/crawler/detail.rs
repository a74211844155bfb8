//! Incident detail pages

use crate::config::SourceConfig;
use crate::crawler::request::UpstreamRequest;
use crate::incident::IncidentId;
use crate::Result;
use url::Url;

/// Request that retrieves the detail page of one incident
pub fn report_request(source: &SourceConfig, id: &IncidentId) -> Result<UpstreamRequest> {
    Ok(UpstreamRequest::get(Url::parse(&source.detail_url)?)
        .param(source.id_param.clone(), id.as_str()))
}
