//! Function dispatch
//!
//! Maps the function name of an invocation (the first argument) to a handler
//! and gives the handler typed access to its parameters, the state layer,
//! events and the creator identity.
//!
//! Handler results are JSON-encoded into the response payload; a unit or
//! `None` result yields an empty payload. Handler errors become failure
//! responses carrying the error message.

use crate::convert::{ConvertError, FromBytes, Json, ToBytes};
use crate::errors::HarnessError;
use crate::identity::SerializedIdentity;
use crate::response::Response;
use crate::state::{State, StateError};
use crate::stub::{Chaincode, ChaincodeStub};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors produced while dispatching or inside handlers
#[derive(Debug, Error)]
pub enum ChaincodeError {
    #[error("unknown function: {function}")]
    UnknownFunction { function: String },

    #[error("missing parameter at position {index}")]
    MissingParam { index: usize },

    #[error("invalid parameter at position {index}: {source}")]
    InvalidParam { index: usize, source: ConvertError },

    #[error("creator identity is not set")]
    NoCreator,

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error>),
}

impl ChaincodeError {
    /// Wrap a handler-specific error
    pub fn other<E: std::error::Error + 'static>(err: E) -> Self {
        ChaincodeError::Other(Box::new(err))
    }
}

type Handler = Box<dyn Fn(&mut Context<'_>) -> Result<Vec<u8>, ChaincodeError>>;

/// Handler context for one invocation
///
/// On `invoke` the first argument is the function name and parameters start
/// at the second one. On `init` there is no function name and every argument
/// is a parameter. The name is decoded lossily for display only; `Router`
/// matches handlers on the exact bytes.
pub struct Context<'a> {
    stub: &'a mut dyn ChaincodeStub,
    function: String,
    offset: usize,
}

impl<'a> Context<'a> {
    /// Context of an `invoke` call
    pub fn new(stub: &'a mut dyn ChaincodeStub) -> Self {
        let function = stub
            .args()
            .first()
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .unwrap_or_default();
        Self {
            stub,
            function,
            offset: 1,
        }
    }

    /// Context of an `init` call
    pub fn for_init(stub: &'a mut dyn ChaincodeStub) -> Self {
        Self {
            stub,
            function: String::new(),
            offset: 0,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// Raw parameters
    pub fn params(&self) -> &[Vec<u8>] {
        self.stub.args().get(self.offset..).unwrap_or(&[])
    }

    /// Decode the parameter at `index`
    pub fn param<T: FromBytes>(&self, index: usize) -> Result<T, ChaincodeError> {
        let raw = self
            .params()
            .get(index)
            .ok_or(ChaincodeError::MissingParam { index })?;
        T::from_bytes(raw).map_err(|source| ChaincodeError::InvalidParam { index, source })
    }

    /// Decode the JSON parameter at `index`
    pub fn param_json<T: DeserializeOwned>(&self, index: usize) -> Result<T, ChaincodeError> {
        self.param::<Json<T>>(index).map(|Json(value)| value)
    }

    pub fn tx_id(&self) -> &str {
        self.stub.tx_id()
    }

    pub fn stub(&mut self) -> &mut dyn ChaincodeStub {
        &mut *self.stub
    }

    pub fn state(&mut self) -> State<'_> {
        State::new(&mut *self.stub)
    }

    /// Emit `payload` as the event of this call
    pub fn set_event<T: Serialize>(&mut self, name: &str, payload: &T) -> Result<(), ChaincodeError> {
        let bytes = Json(payload).to_bytes()?;
        self.stub.set_event(name, bytes)?;
        Ok(())
    }

    /// Decoded creator identity of the current transaction
    pub fn creator(&self) -> Result<SerializedIdentity, ChaincodeError> {
        let bytes = self.stub.creator()?.ok_or(ChaincodeError::NoCreator)?;
        Ok(SerializedIdentity::from_bytes(&bytes)?)
    }
}

/// Chaincode built from named handlers
///
/// # Example
///
/// ```rust
/// use chaincode_mock_core_rs::dispatch::{ChaincodeError, Context, Router};
/// use chaincode_mock_core_rs::MockStub;
///
/// let router = Router::new("greeter")
///     .route("hello", |ctx: &mut Context<'_>| -> Result<String, ChaincodeError> {
///         let name: String = ctx.param(0)?;
///         Ok(format!("hello {}", name))
///     });
///
/// let stub = MockStub::new("greeter", router);
/// let response = stub.invoke("hello", ("world",));
///
/// assert_eq!(response.payload_json::<String>().unwrap(), "hello world");
/// assert!(stub.invoke("bye", ()).is_err());
/// ```
pub struct Router {
    name: String,
    init: Option<Handler>,
    handlers: BTreeMap<String, Handler>,
}

impl Router {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init: None,
            handlers: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler for the `init` entry point (default: empty success)
    pub fn with_init<F, R>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<R, ChaincodeError> + 'static,
        R: Serialize,
    {
        self.init = Some(wrap(handler));
        self
    }

    /// Handler for `function` on the `invoke` entry point
    pub fn route<F, R>(mut self, function: &str, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<R, ChaincodeError> + 'static,
        R: Serialize,
    {
        self.handlers.insert(function.to_string(), wrap(handler));
        self
    }

    /// Registered function names, sorted
    pub fn functions(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    fn run(&self, handler: Option<&Handler>, mut ctx: Context<'_>) -> Response {
        let result = match handler {
            Some(handler) => handler(&mut ctx),
            None => Err(ChaincodeError::UnknownFunction {
                function: ctx.function().to_string(),
            }),
        };

        match result {
            Ok(payload) => Response::success(payload),
            Err(err) => {
                debug!(chaincode = %self.name, function = ctx.function(), error = %err, "handler failed");
                Response::error(err.to_string())
            }
        }
    }
}

fn wrap<F, R>(handler: F) -> Handler
where
    F: Fn(&mut Context<'_>) -> Result<R, ChaincodeError> + 'static,
    R: Serialize,
{
    Box::new(handler_fn(move |ctx| {
        let value = serde_json::to_value(handler(ctx)?).map_err(ConvertError::from)?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::to_vec(&value).map_err(ConvertError::from)?)
    }))
}

// Pins the higher-ranked closure signature before boxing.
fn handler_fn<F>(f: F) -> F
where
    F: Fn(&mut Context<'_>) -> Result<Vec<u8>, ChaincodeError>,
{
    f
}

impl Chaincode for Router {
    fn init(&self, stub: &mut dyn ChaincodeStub) -> Response {
        match &self.init {
            Some(handler) => self.run(Some(handler), Context::for_init(stub)),
            None => Response::success(Vec::new()),
        }
    }

    fn invoke(&self, stub: &mut dyn ChaincodeStub) -> Response {
        // A function name that is not valid UTF-8 never matches a handler
        let handler = match stub.args().first().map(|raw| std::str::from_utf8(raw)) {
            Some(Ok(function)) => self.handlers.get(function),
            Some(Err(_)) => None,
            None => self.handlers.get(""),
        };
        self.run(handler, Context::new(stub))
    }
}
