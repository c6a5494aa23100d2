//! Typed CRUD facade for the todo and post collections.
//!
//! # Design
//! `TodoClient` holds a shared [`Dispatcher`] and a `base_url`. Each operation
//! is split into a `build_*` method that produces a [`RequestDescriptor`] and a
//! `parse_*` method that consumes an [`Envelope`]; the async method in between
//! just sends. Building and parsing stay pure, so they are tested without any
//! network.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::descriptor::RequestDescriptor;
use crate::dispatcher::Dispatcher;
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::types::{CreateTodo, Post, Todo, UpdateTodo};

/// Query parameter the collection routes use to cap list results.
pub const LIMIT_PARAM: &str = "_limit";

#[derive(Debug, Clone)]
pub struct TodoClient {
    dispatcher: Arc<Dispatcher>,
    base_url: String,
}

impl TodoClient {
    pub fn new(dispatcher: Arc<Dispatcher>, base_url: &str) -> Self {
        Self {
            dispatcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub async fn list_todos(&self, limit: Option<usize>) -> Result<Vec<Todo>, ApiError> {
        let envelope = self.dispatcher.send(self.build_list_todos(limit)).await?;
        self.parse_list_todos(envelope)
    }

    pub async fn get_todo(&self, id: u64) -> Result<Todo, ApiError> {
        let envelope = self.dispatcher.send(self.build_get_todo(id)).await?;
        self.parse_get_todo(envelope)
    }

    pub async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, ApiError> {
        let envelope = self.dispatcher.send(self.build_create_todo(input)?).await?;
        self.parse_create_todo(envelope)
    }

    pub async fn replace_todo(&self, id: u64, input: &CreateTodo) -> Result<Todo, ApiError> {
        let envelope = self.dispatcher.send(self.build_replace_todo(id, input)?).await?;
        self.parse_update_todo(envelope)
    }

    pub async fn update_todo(&self, id: u64, input: &UpdateTodo) -> Result<Todo, ApiError> {
        let envelope = self.dispatcher.send(self.build_update_todo(id, input)?).await?;
        self.parse_update_todo(envelope)
    }

    pub async fn delete_todo(&self, id: u64) -> Result<(), ApiError> {
        self.dispatcher.send(self.build_delete_todo(id)).await?;
        Ok(())
    }

    pub async fn list_posts(&self, limit: Option<usize>) -> Result<Vec<Post>, ApiError> {
        let envelope = self.dispatcher.send(self.build_list_posts(limit)).await?;
        parse_body(&envelope)
    }

    pub fn build_list_todos(&self, limit: Option<usize>) -> RequestDescriptor {
        with_limit(RequestDescriptor::get(self.url("todos")), limit)
    }

    pub fn build_get_todo(&self, id: u64) -> RequestDescriptor {
        RequestDescriptor::get(self.url(&format!("todos/{id}")))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<RequestDescriptor, ApiError> {
        with_json(RequestDescriptor::post(self.url("todos")), input)
    }

    pub fn build_replace_todo(
        &self,
        id: u64,
        input: &CreateTodo,
    ) -> Result<RequestDescriptor, ApiError> {
        with_json(RequestDescriptor::put(self.url(&format!("todos/{id}"))), input)
    }

    pub fn build_update_todo(
        &self,
        id: u64,
        input: &UpdateTodo,
    ) -> Result<RequestDescriptor, ApiError> {
        with_json(RequestDescriptor::patch(self.url(&format!("todos/{id}"))), input)
    }

    pub fn build_delete_todo(&self, id: u64) -> RequestDescriptor {
        RequestDescriptor::delete(self.url(&format!("todos/{id}")))
    }

    pub fn build_list_posts(&self, limit: Option<usize>) -> RequestDescriptor {
        with_limit(RequestDescriptor::get(self.url("posts")), limit)
    }

    pub fn parse_list_todos(&self, envelope: Envelope) -> Result<Vec<Todo>, ApiError> {
        parse_body(&envelope)
    }

    pub fn parse_get_todo(&self, envelope: Envelope) -> Result<Todo, ApiError> {
        parse_body(&envelope)
    }

    pub fn parse_create_todo(&self, envelope: Envelope) -> Result<Todo, ApiError> {
        parse_body(&envelope)
    }

    pub fn parse_update_todo(&self, envelope: Envelope) -> Result<Todo, ApiError> {
        parse_body(&envelope)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

fn with_limit(descriptor: RequestDescriptor, limit: Option<usize>) -> RequestDescriptor {
    match limit {
        Some(limit) => descriptor.param(LIMIT_PARAM, limit),
        None => descriptor,
    }
}

fn with_json<T: Serialize>(
    descriptor: RequestDescriptor,
    input: &T,
) -> Result<RequestDescriptor, ApiError> {
    let body = serde_json::to_value(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(descriptor.body(body))
}

fn parse_body<T: DeserializeOwned>(envelope: &Envelope) -> Result<T, ApiError> {
    envelope
        .json()
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}
