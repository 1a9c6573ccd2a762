//! Reqwest-based client for the workflow API.

use std::sync::Arc;

use flowdesk_core::graph::{Edge, Node, Workflow};
use flowdesk_core::id::{EdgeId, InstanceId, NodeId, RunId, WorkflowId};
use flowdesk_core::provider::{
    CreateEdge, CreateNode, CreateRun, CreateWorkflow, DeletionConflict, NodeDeletion, Retrigger,
    UpdateNode, UpdateWorkflow, UploadDocument, UploadedDocument,
};
use flowdesk_core::run::{DocumentInstance, InspectorTab, NodeStatusCount, NodeSummary, Run};
use flowdesk_core::{FlowProvider, FlowService};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{Error, ReqwestConfig, Result, TRACING_TARGET};

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based implementation of [`FlowProvider`].
///
/// Cloning is cheap; clones share the connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use flowdesk_reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::default())?;
/// let nodes = client.list_nodes(workflow_id).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("timeout", &self.inner.config.effective_timeout())
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        if config.base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(config.base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        let inner = ReqwestClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`FlowService`].
    pub fn into_service(self) -> FlowService {
        FlowService::new(self)
    }

    /// Resolves an API path below the configured base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidBaseUrl(self.inner.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.http.request(method, url);
        match &self.inner.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and turns non-success statuses into errors.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();

        tracing::trace!(
            target: TRACING_TARGET,
            url = %response.url(),
            status = status.as_u16(),
            "Received response"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Status { status, body })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl FlowProvider for ReqwestClient {
    async fn list_workflows(&self) -> flowdesk_core::Result<Vec<Workflow>> {
        let url = self.endpoint(&["workflows"])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn get_workflow(&self, workflow_id: WorkflowId) -> flowdesk_core::Result<Workflow> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string()])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn create_workflow(&self, request: &CreateWorkflow) -> flowdesk_core::Result<Workflow> {
        let url = self.endpoint(&["workflows"])?;
        let builder = self.request(Method::POST, url).json(request);
        Ok(self.send_json(builder).await?)
    }

    async fn update_workflow(
        &self,
        workflow_id: WorkflowId,
        request: &UpdateWorkflow,
    ) -> flowdesk_core::Result<Workflow> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string()])?;
        let builder = self.request(Method::PATCH, url).json(request);
        Ok(self.send_json(builder).await?)
    }

    async fn delete_workflow(&self, workflow_id: WorkflowId) -> flowdesk_core::Result<()> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string()])?;
        Ok(self.send_empty(self.request(Method::DELETE, url)).await?)
    }

    async fn list_nodes(&self, workflow_id: WorkflowId) -> flowdesk_core::Result<Vec<Node>> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string(), "nodes"])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn create_node(
        &self,
        workflow_id: WorkflowId,
        request: &CreateNode,
    ) -> flowdesk_core::Result<Node> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string(), "nodes"])?;
        let builder = self.request(Method::POST, url).json(request);
        Ok(self.send_json(builder).await?)
    }

    async fn update_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        request: &UpdateNode,
    ) -> flowdesk_core::Result<Node> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "nodes",
            &node_id.to_string(),
        ])?;
        let builder = self.request(Method::PATCH, url).json(request);
        Ok(self.send_json(builder).await?)
    }

    async fn delete_node(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        force: bool,
    ) -> flowdesk_core::Result<NodeDeletion> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "nodes",
            &node_id.to_string(),
        ])?;

        let mut builder = self.request(Method::DELETE, url);
        if force {
            builder = builder.query(&[("force", "true")]);
        }

        match self.send(builder).await {
            Ok(_) => Ok(NodeDeletion::Deleted),
            Err(Error::Status {
                status: StatusCode::CONFLICT,
                body,
            }) => {
                let conflict: DeletionConflict =
                    serde_json::from_str(&body).map_err(Error::from)?;
                Ok(NodeDeletion::Conflict(conflict))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_edges(&self, workflow_id: WorkflowId) -> flowdesk_core::Result<Vec<Edge>> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string(), "edges"])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn create_edge(
        &self,
        workflow_id: WorkflowId,
        request: &CreateEdge,
    ) -> flowdesk_core::Result<Edge> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string(), "edges"])?;
        let builder = self.request(Method::POST, url).json(request);
        Ok(self.send_json(builder).await?)
    }

    async fn delete_edge(
        &self,
        workflow_id: WorkflowId,
        edge_id: EdgeId,
    ) -> flowdesk_core::Result<()> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "edges",
            &edge_id.to_string(),
        ])?;
        Ok(self.send_empty(self.request(Method::DELETE, url)).await?)
    }

    async fn upload_document(
        &self,
        workflow_id: WorkflowId,
        request: UploadDocument,
    ) -> flowdesk_core::Result<UploadedDocument> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string(), "documents"])?;

        let mut part = Part::bytes(request.content.to_vec()).file_name(request.file_name);
        if let Some(content_type) = &request.content_type {
            part = part.mime_str(content_type).map_err(Error::from)?;
        }

        let mut form = Form::new().part("file", part);
        if let Some(trigger_node_id) = request.trigger_node_id {
            form = form.text("triggerNodeId", trigger_node_id.to_string());
        }

        let builder = self.request(Method::POST, url).multipart(form);
        Ok(self.send_json(builder).await?)
    }

    async fn create_run(
        &self,
        workflow_id: WorkflowId,
        request: &CreateRun,
    ) -> flowdesk_core::Result<Run> {
        let url = self.endpoint(&["workflows", &workflow_id.to_string(), "runs"])?;
        let builder = self.request(Method::POST, url).json(request);
        Ok(self.send_json(builder).await?)
    }

    async fn get_run(&self, run_id: RunId) -> flowdesk_core::Result<Run> {
        let url = self.endpoint(&["runs", &run_id.to_string()])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn get_run_node_counts(
        &self,
        run_id: RunId,
    ) -> flowdesk_core::Result<Vec<NodeStatusCount>> {
        let url = self.endpoint(&["runs", &run_id.to_string(), "node-counts"])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn get_node_summary(
        &self,
        workflow_id: WorkflowId,
    ) -> flowdesk_core::Result<Vec<NodeSummary>> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "inspector",
            "summary",
        ])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn list_node_documents(
        &self,
        workflow_id: WorkflowId,
        node_id: NodeId,
        tab: InspectorTab,
    ) -> flowdesk_core::Result<Vec<DocumentInstance>> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "inspector",
            "nodes",
            &node_id.to_string(),
            "documents",
        ])?;
        let builder = self
            .request(Method::GET, url)
            .query(&[("tab", tab.as_ref())]);
        Ok(self.send_json(builder).await?)
    }

    async fn list_orphaned_documents(
        &self,
        workflow_id: WorkflowId,
    ) -> flowdesk_core::Result<Vec<DocumentInstance>> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "inspector",
            "orphaned",
        ])?;
        Ok(self.send_json(self.request(Method::GET, url)).await?)
    }

    async fn delete_document(
        &self,
        workflow_id: WorkflowId,
        instance_id: InstanceId,
    ) -> flowdesk_core::Result<()> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "inspector",
            "documents",
            &instance_id.to_string(),
        ])?;
        Ok(self.send_empty(self.request(Method::DELETE, url)).await?)
    }

    async fn retrigger(
        &self,
        workflow_id: WorkflowId,
        request: &Retrigger,
    ) -> flowdesk_core::Result<()> {
        let url = self.endpoint(&[
            "workflows",
            &workflow_id.to_string(),
            "inspector",
            "retrigger",
        ])?;
        let builder = self.request(Method::POST, url).json(request);
        Ok(self.send_empty(builder).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{delete, get};
    use axum::{Json, Router};
    use flowdesk_core::ErrorKind;
    use flowdesk_core::graph::NodeKind;
    use serde_json::json;

    use super::*;

    async fn list_nodes(headers: HeaderMap, Path(_): Path<String>) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer secret");
        if !authorized {
            return AxumStatus::UNAUTHORIZED.into_response();
        }

        Json(json!([{
            "id": "0190a000-0000-7000-8000-000000000001",
            "type": "CONDITIONAL_IF",
            "name": "Check total",
            "x": 10.0,
            "y": 20.0,
            "config": {}
        }]))
        .into_response()
    }

    async fn delete_node(
        Path((_, _)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        if query.get("force").map(String::as_str) == Some("true") {
            return AxumStatus::NO_CONTENT.into_response();
        }

        (
            AxumStatus::CONFLICT,
            Json(json!({ "heldCount": 2, "unroutedCount": 1 })),
        )
            .into_response()
    }

    async fn node_documents(
        Path((_, _)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        assert_eq!(query.get("tab").map(String::as_str), Some("held"));
        Json(json!([]))
    }

    async fn spawn_server() -> Url {
        let app = Router::new()
            .route("/api/workflows/{workflow_id}/nodes", get(list_nodes))
            .route(
                "/api/workflows/{workflow_id}/nodes/{node_id}",
                delete(delete_node),
            )
            .route(
                "/api/workflows/{workflow_id}/inspector/nodes/{node_id}/documents",
                get(node_documents),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Url::parse(&format!("http://{addr}/api")).unwrap()
    }

    fn client(base_url: Url, token: Option<&str>) -> ReqwestClient {
        let mut config = ReqwestConfig::new(base_url);
        if let Some(token) = token {
            config = config.with_api_token(token);
        }
        ReqwestClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_with_and_without_trailing_slash() {
        for base in ["http://localhost/api", "http://localhost/api/"] {
            let client = client(Url::parse(base).unwrap(), None);
            let url = client.endpoint(&["runs", "abc", "node-counts"]).unwrap();
            assert_eq!(url.as_str(), "http://localhost/api/runs/abc/node-counts");
        }
    }

    #[test]
    fn test_rejects_non_base_url() {
        let config = ReqwestConfig::new(Url::parse("mailto:ops@example.com").unwrap());
        assert!(matches!(
            ReqwestClient::new(config),
            Err(Error::InvalidBaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_nodes_sends_bearer_token() {
        let base_url = spawn_server().await;
        let nodes = client(base_url, Some("secret"))
            .list_nodes(WorkflowId::new())
            .await
            .unwrap();

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind(), NodeKind::ConditionalIf);
        assert_eq!(nodes[0].ports().output_ids(), vec!["true", "false"]);
    }

    #[tokio::test]
    async fn test_missing_token_maps_to_authentication() {
        let base_url = spawn_server().await;
        let error = client(base_url, None)
            .list_nodes(WorkflowId::new())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_delete_node_conflict_is_an_outcome() {
        let base_url = spawn_server().await;
        let client = client(base_url, None);

        let outcome = client
            .delete_node(WorkflowId::new(), NodeId::new(), false)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            NodeDeletion::Conflict(DeletionConflict {
                held_count: 2,
                unrouted_count: 1
            })
        );

        let outcome = client
            .delete_node(WorkflowId::new(), NodeId::new(), true)
            .await
            .unwrap();
        assert!(outcome.is_deleted());
    }

    #[tokio::test]
    async fn test_node_documents_sends_tab() {
        let base_url = spawn_server().await;
        let documents = client(base_url, None)
            .list_node_documents(WorkflowId::new(), NodeId::new(), InspectorTab::Held)
            .await
            .unwrap();

        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_maps_to_not_found() {
        let base_url = spawn_server().await;
        let error = client(base_url, None)
            .get_run(RunId::new())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }
}
