//! Pagination detection.
//!
//! Classifies a statement as logically paginated (dangerous: the framework
//! slices a fully-fetched result in memory), physically paginated (the
//! database slices), or not paginated at all. Three signals feed the
//! decision: a LIMIT clause in the AST, page-shaped parameters on the
//! context, and pagination plugins registered at the mapper layer.
//!
//! Plugins are described by name only and matched by suffix, so the engine
//! never links against any concrete pagination library.

use sqlparser::ast::Statement;
use tracing::debug;

use sqlsentinel_config::PaginationConfig;
use sqlsentinel_types::PaginationKind;

use crate::ast;
use crate::context::SqlContext;

/// An interceptor/handler registered at the mapper layer, reduced to the
/// only attribute the detector is allowed to look at: its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    name: String,
}

impl PluginDescriptor {
    /// `name` is typically the fully-qualified class name of the registered
    /// interceptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Classifies how a statement will be paginated, if at all.
#[derive(Debug, Clone)]
pub struct PaginationDetector {
    plugins: Vec<PluginDescriptor>,
    plugin_suffixes: Vec<String>,
}

impl PaginationDetector {
    pub fn new(config: &PaginationConfig, plugins: Vec<PluginDescriptor>) -> Self {
        Self {
            plugins,
            plugin_suffixes: config.plugin_suffixes.clone(),
        }
    }

    /// Decision rules, in order:
    /// 1. page parameters without a LIMIT and without a rewriting plugin
    ///    mean the slicing happens in application memory → `Logical`;
    /// 2. a LIMIT in the SQL, or page parameters a plugin will turn into
    ///    one, mean the database slices → `Physical`;
    /// 3. otherwise → `None`.
    pub fn detect(&self, context: &SqlContext, statement: Option<&Statement>) -> PaginationKind {
        let has_limit = statement.is_some_and(ast::has_limit);
        let has_page_param = context.has_page_parameter();
        let has_plugin = self.has_pagination_plugin();

        let kind = if has_page_param && !has_limit && !has_plugin {
            PaginationKind::Logical
        } else if has_limit || (has_page_param && has_plugin) {
            PaginationKind::Physical
        } else {
            PaginationKind::None
        };

        debug!(
            statement_id = %context.statement_id,
            has_limit,
            has_page_param,
            has_plugin,
            ?kind,
            "classified pagination"
        );
        kind
    }

    /// Whether any registered plugin looks like a pagination interceptor.
    fn has_pagination_plugin(&self) -> bool {
        self.plugins.iter().any(|plugin| {
            self.plugin_suffixes
                .iter()
                .any(|suffix| plugin.name().ends_with(suffix))
        })
    }
}
