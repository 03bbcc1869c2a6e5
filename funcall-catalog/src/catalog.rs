//! The function catalog: register, look up, and invoke functions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use funcall_types::{
    DescriptorError, Function, FunctionDyn, FunctionError, FunctionFuture, FunctionSignature,
};

/// A boxed async implementation paired with a loaded signature.
pub type BoxedFunctionImpl =
    Box<dyn Fn(serde_json::Value) -> FunctionFuture<'static> + Send + Sync>;

/// Adapter turning an async closure plus a signature into a [`FunctionDyn`].
struct ClosureFunction<F> {
    signature: FunctionSignature,
    f: F,
}

impl<F, Fut> FunctionDyn for ClosureFunction<F>
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<serde_json::Value, FunctionError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.signature.name
    }

    fn signature(&self) -> FunctionSignature {
        self.signature.clone()
    }

    fn invoke_dyn(&self, arguments: serde_json::Value) -> FunctionFuture<'_> {
        Box::pin((self.f)(arguments))
    }
}

/// Adapter for pre-boxed implementations from [`FunctionCatalog::bind_signatures`].
struct BoundFunction {
    signature: FunctionSignature,
    f: BoxedFunctionImpl,
}

impl FunctionDyn for BoundFunction {
    fn name(&self) -> &str {
        &self.signature.name
    }

    fn signature(&self) -> FunctionSignature {
        self.signature.clone()
    }

    fn invoke_dyn(&self, arguments: serde_json::Value) -> FunctionFuture<'_> {
        (self.f)(arguments)
    }
}

/// Mapping from function name to (declared signature, implementation).
///
/// Built once at startup and read-only afterwards. Entries keep their
/// registration order, so the signature list advertised to the model is
/// identical on every call within a run.
///
/// Functions are stored as type-erased [`FunctionDyn`] trait objects.
#[derive(Default)]
pub struct FunctionCatalog {
    entries: Vec<Arc<dyn FunctionDyn>>,
    index: HashMap<String, usize>,
    signatures: Vec<FunctionSignature>,
}

impl FunctionCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strongly-typed function (auto-erased to `FunctionDyn`).
    ///
    /// Registering a name twice replaces the earlier entry and keeps its
    /// original position.
    pub fn register<F: Function + 'static>(&mut self, function: F) {
        self.register_dyn(Arc::new(function));
    }

    /// Register a pre-erased function.
    pub fn register_dyn(&mut self, function: Arc<dyn FunctionDyn>) {
        let name = function.name().to_string();
        let signature = function.signature();
        tracing::debug!(function = %name, "registering function");
        match self.index.get(&name) {
            Some(&pos) => {
                self.entries[pos] = function;
                self.signatures[pos] = signature;
            }
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(function);
                self.signatures.push(signature);
            }
        }
    }

    /// Register an async closure under the given signature.
    ///
    /// The closure receives the parsed JSON arguments and returns a JSON
    /// result. Useful when signatures come from a descriptor file rather
    /// than typed [`Function`] impls.
    pub fn register_fn<F, Fut>(&mut self, signature: FunctionSignature, f: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, FunctionError>> + Send + 'static,
    {
        self.register_dyn(Arc::new(ClosureFunction { signature, f }));
    }

    /// Pair loaded signatures with boxed implementations by name.
    ///
    /// Signatures keep their load order. Fails with
    /// [`DescriptorError::MissingImplementation`] when a signature has no
    /// implementation; implementations without a signature are ignored.
    pub fn bind_signatures(
        &mut self,
        signatures: Vec<FunctionSignature>,
        mut implementations: HashMap<String, BoxedFunctionImpl>,
    ) -> Result<(), DescriptorError> {
        for signature in signatures {
            let f = implementations
                .remove(&signature.name)
                .ok_or_else(|| DescriptorError::MissingImplementation(signature.name.clone()))?;
            self.register_dyn(Arc::new(BoundFunction { signature, f }));
        }
        Ok(())
    }

    /// Look up a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FunctionDyn>> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    /// Whether a function with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The declared signatures, in registration order.
    #[must_use]
    pub fn signatures(&self) -> &[FunctionSignature] {
        &self.signatures
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke a function by name with parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`FunctionError::NotFound`] for an unregistered name;
    /// otherwise whatever the implementation returns. Callers that need a
    /// different unknown-name policy should check [`Self::get`] first.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, FunctionError> {
        let function = self
            .get(name)
            .ok_or_else(|| FunctionError::NotFound(name.to_string()))?;
        function.invoke_dyn(arguments).await
    }
}
