//! Static tool table.
//!
//! Tools are registered explicitly, in order, before the server starts listening. After that
//! the registry is only read (shared behind an `Arc`), so lookups need no locking.

use crate::context::ToolContext;
use crate::error::{Result, ToolResult, ToolboxError};
use async_trait::async_trait;
use rmcp::model::{JsonObject, Tool};
use std::collections::HashMap;
use std::sync::Arc;

/// A callable tool body.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ToolError`] for failures that should be reported as an error
    /// tool result.
    async fn call(&self, ctx: &ToolContext<'_>, args: &JsonObject) -> ToolResult;
}

/// Adapter for synchronous tools that need no I/O.
pub struct FnTool<F>(pub F);

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(&ToolContext<'_>, &JsonObject) -> ToolResult + Send + Sync,
{
    async fn call(&self, ctx: &ToolContext<'_>, args: &JsonObject) -> ToolResult {
        (self.0)(ctx, args)
    }
}

pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<JsonObject>,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    /// MCP `tools/list` entry for this tool.
    #[must_use]
    pub fn to_tool(&self) -> Tool {
        Tool::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        )
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Default, Debug)]
pub struct ToolRegistry {
    /// Registration order.
    tools: Vec<ToolDescriptor>,
    /// name -> index into `tools`
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::DuplicateTool`] if `name` is already registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: JsonObject,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<()> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ToolboxError::DuplicateTool(name));
        }

        self.by_name.insert(name.clone(), self.tools.len());
        self.tools.push(ToolDescriptor {
            name,
            description: description.into(),
            input_schema: Arc::new(input_schema),
            handler,
        });
        Ok(())
    }

    /// Look up a tool by its exposed name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::UnknownTool`] if no tool has that name.
    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor> {
        self.by_name
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolboxError::UnknownTool(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `tools/list` payload, in registration order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolDescriptor::to_tool).collect()
    }
}
