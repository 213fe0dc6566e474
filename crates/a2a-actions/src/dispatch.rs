//! JSON-RPC action dispatch
//!
//! Each request walks the same path and stops at the first failure:
//!
//! 1. **Parse** the envelope (`ParseError` / `InvalidRequest`)
//! 2. **Resolve** the action by name (`MethodNotFound`)
//! 3. **Validate** params against the declared shape (`InvalidParams`)
//! 4. **Authorize** the caller (`Unauthorized`)
//! 5. **Invoke** the handler on its own task under a deadline (`InternalError`)
//! 6. **Respond** with the request id echoed and exactly one of result/error
//!
//! Under [`DenyPolicy::Conceal`] steps 3 and 4 swap, so a caller without
//! access learns nothing about a secured action, not even its arity.

use std::sync::Arc;
use std::time::Duration;

use a2a_json_rpc::{JsonRpcError, JsonRpcMessage, JsonRpcRequest, RequestId, parse_request};
use tracing::{debug, error, warn};

use crate::action::ActionDescriptor;
use crate::auth::{AuthorizationGate, CallerContext, Decision};
use crate::error::HandlerError;
use crate::params::ActionArgs;
use crate::registry::ActionRegistry;

/// Default deadline for a single handler invocation
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// How an authorization denial is reported to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DenyPolicy {
    /// Answer with the generic `Unauthorized` error
    #[default]
    Reveal,
    /// Answer as if the action did not exist
    Conceal,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Deadline for the invoke step; `None` waits indefinitely
    pub invoke_timeout: Option<Duration>,
    pub deny_policy: DenyPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            invoke_timeout: Some(DEFAULT_INVOKE_TIMEOUT),
            deny_policy: DenyPolicy::Reveal,
        }
    }
}

impl DispatchConfig {
    pub fn invoke_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    pub fn deny_policy(mut self, policy: DenyPolicy) -> Self {
        self.deny_policy = policy;
        self
    }
}

/// Routes JSON-RPC requests to registered actions
#[derive(Clone)]
pub struct ActionDispatcher {
    registry: Arc<ActionRegistry>,
    gate: AuthorizationGate,
    config: DispatchConfig,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    pub fn with_config(registry: Arc<ActionRegistry>, config: DispatchConfig) -> Self {
        Self {
            registry,
            gate: AuthorizationGate::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Decode a raw body and dispatch it
    pub async fn dispatch_bytes(&self, body: &[u8], caller: &CallerContext) -> JsonRpcMessage {
        match parse_request(body) {
            Ok(request) => self.dispatch(request, caller).await,
            Err(rejected) => {
                debug!(
                    principal = %caller.principal_id,
                    code = rejected.error.code,
                    "Rejected malformed envelope"
                );
                JsonRpcMessage::error(rejected)
            }
        }
    }

    /// Dispatch an already-decoded request on behalf of `caller`
    pub async fn dispatch(&self, request: JsonRpcRequest, caller: &CallerContext) -> JsonRpcMessage {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!(%id, %method, principal = %caller.principal_id, "Dispatching action");

        let descriptor = match self.registry.lookup(&method) {
            Ok(descriptor) => descriptor,
            Err(_) => {
                debug!(%id, %method, "Unknown action");
                return JsonRpcError::method_not_found(id, &method).into();
            }
        };

        let conceal = self.config.deny_policy == DenyPolicy::Conceal;
        if conceal {
            if let Err(denied) = self.authorize(&id, &descriptor, caller) {
                return denied;
            }
        }

        let args = match ActionArgs::bind(descriptor.parameters(), params) {
            Ok(args) => args,
            Err(invalid) => {
                debug!(%id, %method, error = %invalid, "Invalid params");
                return JsonRpcError::invalid_params(id, &invalid.to_string()).into();
            }
        };

        if !conceal {
            if let Err(denied) = self.authorize(&id, &descriptor, caller) {
                return denied;
            }
        }

        self.invoke(id, &descriptor, args).await
    }

    fn authorize(
        &self,
        id: &RequestId,
        descriptor: &ActionDescriptor,
        caller: &CallerContext,
    ) -> Result<(), JsonRpcMessage> {
        match self.gate.authorize(descriptor, caller) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    %id,
                    action = descriptor.name(),
                    principal = %caller.principal_id,
                    authenticated = caller.authenticated,
                    required = %descriptor.required_authorization(),
                    %reason,
                    "Authorization denied"
                );
                let response = match self.config.deny_policy {
                    DenyPolicy::Reveal => JsonRpcError::unauthorized(id.clone()),
                    DenyPolicy::Conceal => {
                        JsonRpcError::method_not_found(id.clone(), descriptor.name())
                    }
                };
                Err(response.into())
            }
        }
    }

    async fn invoke(
        &self,
        id: RequestId,
        descriptor: &ActionDescriptor,
        args: ActionArgs,
    ) -> JsonRpcMessage {
        let handler = descriptor.handler();
        let mut task = tokio::spawn(async move { handler.invoke(args).await });

        let joined = match self.config.invoke_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    error!(%id, action = descriptor.name(), ?limit, "Action timed out");
                    return JsonRpcError::internal_error(
                        Some(id),
                        Some("Action timed out".to_string()),
                    )
                    .into();
                }
            },
            None => task.await,
        };

        match joined {
            Ok(Ok(result)) => JsonRpcMessage::success(id, result),
            Ok(Err(HandlerError::Failed(cause))) => {
                error!(%id, action = descriptor.name(), %cause, "Action failed");
                JsonRpcError::internal_error(Some(id), None).into()
            }
            Ok(Err(HandlerError::Public(message))) => {
                debug!(%id, action = descriptor.name(), %message, "Action reported a public error");
                JsonRpcError::internal_error(Some(id), Some(message)).into()
            }
            Ok(Err(invalid @ HandlerError::InvalidArgument { .. })) => {
                debug!(%id, action = descriptor.name(), error = %invalid, "Handler rejected an argument");
                JsonRpcError::invalid_params(id, &invalid.to_string()).into()
            }
            Err(join_error) if join_error.is_panic() => {
                let panic = join_error.into_panic();
                let cause = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(%id, action = descriptor.name(), %cause, "Action panicked");
                JsonRpcError::internal_error(Some(id), None).into()
            }
            Err(join_error) => {
                error!(%id, action = descriptor.name(), error = %join_error, "Action task cancelled");
                JsonRpcError::internal_error(Some(id), None).into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthPredicate;
    use crate::params::ParamType;
    use a2a_json_rpc::JsonRpcErrorCode;
    use serde_json::{Value, json};

    fn registry() -> Arc<ActionRegistry> {
        let registry = ActionRegistry::new();
        registry
            .register(
                ActionDescriptor::builder("echo")
                    .description("Echo the input")
                    .string_param("text")
                    .handler_fn(|args: ActionArgs| async move {
                        Ok::<Value, HandlerError>(json!(args.str(0)?))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                ActionDescriptor::builder("adminOnly")
                    .requires(AuthPredicate::all(["ADMIN"]))
                    .handler_fn(|_args: ActionArgs| async {
                        Ok::<Value, HandlerError>(json!("secret"))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                ActionDescriptor::builder("fail")
                    .param("mode", ParamType::String)
                    .handler_fn(|args: ActionArgs| async move {
                        let outcome: Result<Value, HandlerError> = match args.str(0)? {
                            "public" => Err(HandlerError::public("Booking window closed")),
                            "argument" => Err(HandlerError::invalid_argument("mode", "unsupported")),
                            "panic" => panic!("handler exploded"),
                            _ => Err(HandlerError::failed("db password rejected for svc_user")),
                        };
                        outcome
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                ActionDescriptor::builder("slow")
                    .handler_fn(|_args: ActionArgs| async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok::<Value, HandlerError>(json!("late"))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn category(message: &JsonRpcMessage) -> Option<JsonRpcErrorCode> {
        message.error_object().map(|e| e.category())
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let dispatcher = ActionDispatcher::new(registry());
        let response = dispatcher
            .dispatch_bytes(
                br#"{"jsonrpc":"2.0","id":1,"method":"echo","params":["hi"]}"#,
                &CallerContext::anonymous(),
            )
            .await;

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": "hi"})
        );
    }

    #[tokio::test]
    async fn test_admin_only_requires_admin() {
        let dispatcher = ActionDispatcher::new(registry());
        let request = JsonRpcRequest::new_no_params(2, "adminOnly");

        let denied = dispatcher
            .dispatch(request.clone(), &CallerContext::authenticated("u", ["USER"]))
            .await;
        assert_eq!(denied.id(), Some(&RequestId::Number(2)));
        assert_eq!(category(&denied), Some(JsonRpcErrorCode::Unauthorized));
        assert!(denied.result().is_none());
        assert!(!serde_json::to_string(&denied).unwrap().contains("ADMIN"));

        let allowed = dispatcher
            .dispatch(request, &CallerContext::authenticated("a", ["ADMIN"]))
            .await;
        assert_eq!(allowed.result(), Some(&json!("secret")));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let dispatcher = ActionDispatcher::new(registry());
        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_no_params(3, "noSuchAction"),
                &CallerContext::anonymous(),
            )
            .await;
        assert_eq!(category(&response), Some(JsonRpcErrorCode::MethodNotFound));
        assert_eq!(response.id(), Some(&RequestId::Number(3)));
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let dispatcher = ActionDispatcher::new(registry());
        let caller = CallerContext::anonymous();

        let arity = dispatcher
            .dispatch(JsonRpcRequest::new_no_params(4, "echo"), &caller)
            .await;
        assert_eq!(category(&arity), Some(JsonRpcErrorCode::InvalidParams));

        let wrong_type = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(5, "echo", vec![json!(5)]),
                &caller,
            )
            .await;
        assert_eq!(category(&wrong_type), Some(JsonRpcErrorCode::InvalidParams));
        assert!(wrong_type.error_object().unwrap().message.contains("text"));
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let dispatcher = ActionDispatcher::new(registry());
        let response = dispatcher
            .dispatch_bytes(b"not json at all", &CallerContext::anonymous())
            .await;
        assert_eq!(response.id(), None);
        assert_eq!(category(&response), Some(JsonRpcErrorCode::ParseError));
    }

    #[tokio::test]
    async fn test_handler_failure_hides_cause() {
        let dispatcher = ActionDispatcher::new(registry());
        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(6, "fail", vec![json!("internal")]),
                &CallerContext::anonymous(),
            )
            .await;

        assert_eq!(category(&response), Some(JsonRpcErrorCode::InternalError));
        let body = serde_json::to_string(&response).unwrap();
        assert!(!body.contains("password"));
        assert!(!body.contains("svc_user"));
    }

    #[tokio::test]
    async fn test_public_handler_error_is_forwarded() {
        let dispatcher = ActionDispatcher::new(registry());
        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(7, "fail", vec![json!("public")]),
                &CallerContext::anonymous(),
            )
            .await;
        let error = response.error_object().unwrap();
        assert_eq!(error.category(), JsonRpcErrorCode::InternalError);
        assert_eq!(error.message, "Booking window closed");

        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(8, "fail", vec![json!("argument")]),
                &CallerContext::anonymous(),
            )
            .await;
        assert_eq!(category(&response), Some(JsonRpcErrorCode::InvalidParams));
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let dispatcher = ActionDispatcher::new(registry());
        let caller = CallerContext::anonymous();

        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(9, "fail", vec![json!("panic")]),
                &caller,
            )
            .await;
        assert_eq!(category(&response), Some(JsonRpcErrorCode::InternalError));
        assert!(!serde_json::to_string(&response).unwrap().contains("exploded"));

        let after = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(10, "echo", vec![json!("still here")]),
                &caller,
            )
            .await;
        assert_eq!(after.result(), Some(&json!("still here")));
        assert_eq!(dispatcher.registry().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_handler_times_out() {
        let dispatcher = ActionDispatcher::with_config(
            registry(),
            DispatchConfig::default().invoke_timeout(Some(Duration::from_secs(2))),
        );
        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_no_params(11, "slow"),
                &CallerContext::anonymous(),
            )
            .await;
        assert_eq!(category(&response), Some(JsonRpcErrorCode::InternalError));
        assert_eq!(response.id(), Some(&RequestId::Number(11)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_thread_blocking_handler_times_out() {
        let registry = ActionRegistry::new();
        registry
            .register(
                ActionDescriptor::builder("blocking")
                    .handler_fn(|_args: ActionArgs| async {
                        std::thread::sleep(Duration::from_millis(1500));
                        Ok::<Value, HandlerError>(json!("late"))
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let dispatcher = ActionDispatcher::with_config(
            Arc::new(registry),
            DispatchConfig::default().invoke_timeout(Some(Duration::from_millis(100))),
        );

        let started = std::time::Instant::now();
        let response = dispatcher
            .dispatch(
                JsonRpcRequest::new_no_params(14, "blocking"),
                &CallerContext::anonymous(),
            )
            .await;

        assert!(started.elapsed() < Duration::from_millis(1000));
        assert!(response.result().is_none());
        let error = response.error_object().unwrap();
        assert_eq!(error.category(), JsonRpcErrorCode::InternalError);
        assert_eq!(error.message, "Action timed out");
    }

    #[tokio::test]
    async fn test_conceal_policy_hides_secured_actions() {
        let dispatcher = ActionDispatcher::with_config(
            registry(),
            DispatchConfig::default().deny_policy(DenyPolicy::Conceal),
        );
        let user = CallerContext::authenticated("u", ["USER"]);

        let response = dispatcher
            .dispatch(JsonRpcRequest::new_no_params(12, "adminOnly"), &user)
            .await;
        assert_eq!(category(&response), Some(JsonRpcErrorCode::MethodNotFound));

        let probing = dispatcher
            .dispatch(
                JsonRpcRequest::new_with_array_params(13, "adminOnly", vec![json!("extra")]),
                &user,
            )
            .await;
        assert_eq!(category(&probing), Some(JsonRpcErrorCode::MethodNotFound));
    }

    #[tokio::test]
    async fn test_open_actions_never_unauthorized() {
        let dispatcher = ActionDispatcher::new(registry());
        let anonymous = CallerContext::anonymous();
        for descriptor in dispatcher.registry().list() {
            if descriptor.required_authorization() != &AuthPredicate::Any {
                continue;
            }
            let response = dispatcher
                .dispatch(JsonRpcRequest::new_no_params(0, descriptor.name()), &anonymous)
                .await;
            assert_ne!(category(&response), Some(JsonRpcErrorCode::Unauthorized));
        }
    }
}
