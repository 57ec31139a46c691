//! Tool boundary and registry
//!
//! The model picks one of a closed set of document tools by name and
//! supplies JSON arguments. Arguments are bound to a typed `ToolCall`
//! variant before anything runs; the registry dispatches the variant to the
//! document generator and reports a `ToolOutput` the model can read.

use crate::document::DocumentGenerator;
use crate::error::AgentError;
use crate::llm::{FunctionCall, FunctionDeclaration};
use crate::models::{Customer, DocumentKind, Job, ToolOutput};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

pub const GENERATE_PDF_ACT: &str = "generate_pdf_act";
pub const GENERATE_PDF_INVOICE: &str = "generate_pdf_invoice";

/// Arguments shared by both document tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentArgs {
    pub customer: Customer,
    pub jobs: Vec<Job>,
}

impl DocumentArgs {
    /// Reject inputs the templates cannot render meaningfully
    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(AgentError::InvalidToolInput(
                "jobs must contain at least one item".to_string(),
            ));
        }

        for (index, job) in self.jobs.iter().enumerate() {
            if job.task.trim().is_empty() {
                return Err(AgentError::InvalidToolInput(format!(
                    "jobs[{}].task must not be empty",
                    index
                )));
            }
            if job.price < 0 {
                return Err(AgentError::InvalidToolInput(format!(
                    "jobs[{}].price must not be negative, got {}",
                    index, job.price
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    GenerateAct(DocumentArgs),
    GenerateInvoice(DocumentArgs),
}

impl ToolCall {
    /// Bind a model function call to a typed variant by its registered name
    pub fn parse(name: &str, args: &Value) -> Result<Self> {
        let bind = || {
            serde_json::from_value::<DocumentArgs>(args.clone()).map_err(|e| {
                AgentError::InvalidToolInput(format!("{}: {}", name, e))
            })
        };

        match name {
            GENERATE_PDF_ACT => Ok(ToolCall::GenerateAct(bind()?)),
            GENERATE_PDF_INVOICE => Ok(ToolCall::GenerateInvoice(bind()?)),
            other => Err(AgentError::ToolNotFound(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GenerateAct(_) => GENERATE_PDF_ACT,
            ToolCall::GenerateInvoice(_) => GENERATE_PDF_INVOICE,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            ToolCall::GenerateAct(_) => DocumentKind::Act,
            ToolCall::GenerateInvoice(_) => DocumentKind::Invoice,
        }
    }

    pub fn args(&self) -> &DocumentArgs {
        match self {
            ToolCall::GenerateAct(args) | ToolCall::GenerateInvoice(args) => args,
        }
    }
}

/// Registry of the document tools, backed by one generator
pub struct ToolRegistry {
    generator: DocumentGenerator,
}

impl ToolRegistry {
    pub fn new(generator: DocumentGenerator) -> Self {
        Self { generator }
    }

    pub fn list(&self) -> Vec<&'static str> {
        vec![GENERATE_PDF_ACT, GENERATE_PDF_INVOICE]
    }

    /// Function declarations advertised to the model
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        vec![
            FunctionDeclaration {
                name: GENERATE_PDF_ACT.to_string(),
                description: "Генерирует PDF-акт, в котором заполнены данные клиента, \
                              его банковские реквизиты, а также выполненные задачи"
                    .to_string(),
                parameters: document_args_schema("список выполненных задач для внесения в акт"),
            },
            FunctionDeclaration {
                name: GENERATE_PDF_INVOICE.to_string(),
                description: "Генерирует PDF-счёт, в котором заполнены данные клиента, \
                              а также выполненные задачи"
                    .to_string(),
                parameters: document_args_schema("список выполненных задач для внесения в счёт"),
            },
        ]
    }

    /// Run a typed call; failures are reported in the output, never raised
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        let args = call.args();

        if let Err(e) = args.validate() {
            warn!(tool = call.name(), error = %e, "Tool input rejected");
            return ToolOutput::failed(e.to_string());
        }

        match self
            .generator
            .generate(call.kind(), &args.customer, &args.jobs)
            .await
        {
            Ok(document) => {
                info!(tool = call.name(), pdf = %document.pdf_path.display(), "Tool succeeded");
                ToolOutput::ok(json!({
                    "kind": document.kind,
                    "pdf_path": document.pdf_path,
                    "payload_path": document.payload_path,
                }))
            }
            Err(e) => {
                warn!(tool = call.name(), error = %e, "Tool execution failed");
                ToolOutput::failed(e.to_string())
            }
        }
    }

    /// Parse and run a raw function call from the model
    pub async fn handle(&self, call: &FunctionCall) -> ToolOutput {
        match ToolCall::parse(&call.name, &call.args) {
            Ok(tool_call) => self.dispatch(&tool_call).await,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Unusable function call");
                ToolOutput::failed(e.to_string())
            }
        }
    }
}

fn document_args_schema(jobs_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "customer": {
                "type": "object",
                "description": "данные клиента (заказчика)",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "полное название юридического лица, например, ООО «Рога и копыта»"
                    },
                    "INN": { "type": "string", "description": "ИНН" },
                    "OGRN": { "type": "string", "description": "ОГРН или ОГРНИП" },
                    "address": { "type": "string", "description": "юридический адрес" },
                    "signatory": { "type": "string", "description": "подписант" },
                    "bank": {
                        "type": "object",
                        "description": "банковские реквизиты заказчика",
                        "properties": {
                            "name": { "type": "string", "description": "наименование банка" },
                            "BIC": { "type": "string", "description": "БИК" },
                            "current_account": { "type": "string", "description": "расчётный счёт" },
                            "corporate_account": { "type": "string", "description": "корреспондентский счёт" }
                        },
                        "required": ["name", "BIC", "current_account", "corporate_account"]
                    }
                },
                "required": ["name", "INN", "OGRN", "address", "signatory", "bank"]
            },
            "jobs": {
                "type": "array",
                "description": jobs_description,
                "items": {
                    "type": "object",
                    "properties": {
                        "task": { "type": "string", "description": "выполненная задача" },
                        "price": { "type": "integer", "description": "цена за задачу" }
                    },
                    "required": ["task", "price"]
                }
            }
        },
        "required": ["customer", "jobs"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentConfig;
    use crate::document::testing::RecordingRenderer;
    use crate::models::fixtures::{consulting_job, test_customer};
    use std::sync::Arc;

    fn act_args() -> Value {
        json!({
            "customer": serde_json::to_value(test_customer()).unwrap(),
            "jobs": [{ "task": "Консультация", "price": 5000 }]
        })
    }

    fn registry(root: &std::path::Path, renderer: Arc<RecordingRenderer>) -> ToolRegistry {
        ToolRegistry::new(DocumentGenerator::new(
            DocumentConfig::act(root),
            DocumentConfig::invoice(root),
            renderer,
        ))
    }

    #[test]
    fn test_parse_binds_by_name() {
        let act = ToolCall::parse(GENERATE_PDF_ACT, &act_args()).unwrap();
        let invoice = ToolCall::parse(GENERATE_PDF_INVOICE, &act_args()).unwrap();

        assert_eq!(act.kind(), DocumentKind::Act);
        assert_eq!(invoice.kind(), DocumentKind::Invoice);
        assert_eq!(act.args().jobs, vec![consulting_job()]);
        assert_eq!(act.args().customer, test_customer());
    }

    #[test]
    fn test_unknown_tool() {
        let result = ToolCall::parse("fetch_recent_emails", &act_args());
        assert!(matches!(result, Err(AgentError::ToolNotFound(name)) if name == "fetch_recent_emails"));
    }

    #[test]
    fn test_malformed_args() {
        let result = ToolCall::parse(GENERATE_PDF_ACT, &json!({ "jobs": [] }));
        assert!(matches!(result, Err(AgentError::InvalidToolInput(_))));
    }

    #[test]
    fn test_validation() {
        let mut args = DocumentArgs {
            customer: test_customer(),
            jobs: vec![],
        };
        assert!(args.validate().is_err());

        args.jobs = vec![Job {
            task: "Скидка".to_string(),
            price: -10,
        }];
        assert!(args.validate().is_err());

        args.jobs = vec![Job {
            task: "  ".to_string(),
            price: 10,
        }];
        assert!(args.validate().is_err());

        args.jobs = vec![consulting_job()];
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path(), Arc::new(RecordingRenderer::default()));
        let declarations = registry.declarations();

        let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, registry.list());
        for declaration in &declarations {
            assert_eq!(
                declaration.parameters["required"],
                json!(["customer", "jobs"])
            );
            assert_eq!(
                declaration.parameters["properties"]["customer"]["properties"]["bank"]["required"],
                json!(["name", "BIC", "current_account", "corporate_account"])
            );
        }
    }

    #[tokio::test]
    async fn test_handle_act_writes_payload_and_renders_act_template() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let registry = registry(dir.path(), renderer.clone());

        let output = registry
            .handle(&FunctionCall {
                name: GENERATE_PDF_ACT.to_string(),
                args: act_args(),
            })
            .await;

        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.data["kind"], "act");
        assert_eq!(renderer.templates(), vec![dir.path().join("act.typ")]);

        let raw = std::fs::read_to_string(dir.path().join("act.json")).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value["jobs"],
            json!([{ "task": "Консультация", "price": 5000 }])
        );
        assert!(!dir.path().join("invoice.json").exists());
    }

    #[tokio::test]
    async fn test_render_failure_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(RecordingRenderer::failing("error: file not found"));
        let registry = registry(dir.path(), renderer);

        let output = registry
            .handle(&FunctionCall {
                name: GENERATE_PDF_INVOICE.to_string(),
                args: act_args(),
            })
            .await;

        assert!(!output.success);
        assert!(output.error.unwrap().contains("error: file not found"));
        assert!(!dir.path().join("invoice.pdf").exists());
    }

    #[tokio::test]
    async fn test_rejected_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(RecordingRenderer::default());
        let registry = registry(dir.path(), renderer.clone());

        let output = registry
            .handle(&FunctionCall {
                name: GENERATE_PDF_ACT.to_string(),
                args: json!({
                    "customer": serde_json::to_value(test_customer()).unwrap(),
                    "jobs": []
                }),
            })
            .await;

        assert!(!output.success);
        assert!(renderer.templates().is_empty());
        assert!(!dir.path().join("act.json").exists());
    }

    #[tokio::test]
    async fn test_unknown_function_reported() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path(), Arc::new(RecordingRenderer::default()));

        let output = registry
            .handle(&FunctionCall {
                name: "send_email".to_string(),
                args: json!({}),
            })
            .await;

        assert!(!output.success);
        assert!(output.error.unwrap().contains("send_email"));
    }
}
