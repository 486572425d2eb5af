use nestset_core_types::OperationId;
use thiserror::Error;

/// Result type alias using TreeError
pub type Result<T> = std::result::Result<T, TreeError>;

/// Result type returned by row store implementations
pub type StoreResult<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    Configuration,
    NotFound,
    StaleHandle,
    InvalidState,
    ConstraintViolation,
    IllegalReparent,
    MultipleRoots,
    /// Stored intervals fail containment, width or level rules
    InvariantViolation,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::StaleHandle => "ERR_STALE_HANDLE",
            ExErrorKind::InvalidState => "ERR_INVALID_STATE",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::IllegalReparent => "ERR_ILLEGAL_REPARENT",
            ExErrorKind::MultipleRoots => "ERR_MULTIPLE_ROOTS",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Row stores report failures with this type; `TreeError::Store` carries it
/// to the caller unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    scope: Option<String>,
    operation_id: Option<OperationId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            scope: None,
            operation_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add scope context
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Add operation ID context
    pub fn with_operation_id(mut self, operation_id: OperationId) -> Self {
        self.operation_id = Some(operation_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the scope context, if any
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Get the operation ID context, if any
    pub fn operation_id(&self) -> Option<&OperationId> {
        self.operation_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, " (scope: {})", scope)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for nested-set tree operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Node built with reserved attributes, or an unusable configuration
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Node id does not exist in the scope
    #[error("Node not found: {node_id} (scope: {scope})")]
    NodeNotFound { scope: String, node_id: String },

    /// Arena handle refers to a node that was destroyed or never existed
    #[error("Stale node handle: {handle}")]
    StaleHandle { handle: usize },

    /// Operation requires a node that is already stored
    #[error("Node {node_id} is not committed")]
    NotCommitted { node_id: String },

    /// Attach was called on a node that already has a parent or is stored
    #[error("Node {node_id} is already attached; use move_to to reparent stored nodes")]
    AlreadyAttached { node_id: String },

    /// Two nodes from different scopes were combined
    #[error("Scope mismatch: expected {expected}, found {found}")]
    ScopeMismatch { expected: String, found: String },

    /// A parentless node was saved into a scope that already has a root
    #[error("Scope {scope} already has a root node")]
    MultipleRoots { scope: String },

    /// Reparenting a node under itself or one of its descendants
    #[error("Cannot move node {node_id} under {new_parent_id}: target is inside the moved subtree")]
    IllegalReparent {
        node_id: String,
        new_parent_id: String,
    },

    /// Stored intervals are corrupt
    #[error("Invariant violation in scope {scope}: {reason}")]
    InvariantViolation { scope: String, reason: String },

    /// Row store failure, passed through unchanged
    #[error(transparent)]
    Store(#[from] ExError),
}

impl TreeError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            TreeError::Configuration { .. } => ExErrorKind::Configuration,
            TreeError::NodeNotFound { .. } => ExErrorKind::NotFound,
            TreeError::StaleHandle { .. } => ExErrorKind::StaleHandle,
            TreeError::NotCommitted { .. } => ExErrorKind::InvalidState,
            TreeError::AlreadyAttached { .. } => ExErrorKind::InvalidState,
            TreeError::ScopeMismatch { .. } => ExErrorKind::InvalidInput,
            TreeError::MultipleRoots { .. } => ExErrorKind::MultipleRoots,
            TreeError::IllegalReparent { .. } => ExErrorKind::IllegalReparent,
            TreeError::InvariantViolation { .. } => ExErrorKind::InvariantViolation,
            TreeError::Store(err) => err.kind(),
        }
    }

    pub(crate) fn invariant(scope: &impl std::fmt::Display, reason: impl Into<String>) -> Self {
        TreeError::InvariantViolation {
            scope: scope.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<TreeError> for ExError {
    fn from(err: TreeError) -> Self {
        let kind = err.kind();
        match err {
            TreeError::Store(inner) => inner,
            TreeError::NodeNotFound {
                ref scope,
                ref node_id,
            } => ExError::new(kind)
                .with_entity_id(node_id.clone())
                .with_scope(scope.clone())
                .with_message(err.to_string()),
            TreeError::NotCommitted { ref node_id }
            | TreeError::AlreadyAttached { ref node_id }
            | TreeError::IllegalReparent { ref node_id, .. } => ExError::new(kind)
                .with_entity_id(node_id.clone())
                .with_message(err.to_string()),
            TreeError::MultipleRoots { ref scope }
            | TreeError::InvariantViolation { ref scope, .. } => ExError::new(kind)
                .with_scope(scope.clone())
                .with_message(err.to_string()),
            other => ExError::new(kind).with_message(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for TreeError {
    fn from(err: toml::de::Error) -> Self {
        TreeError::Configuration {
            reason: format!("Invalid tree configuration: {}", err),
        }
    }
}
