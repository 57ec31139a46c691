use billing_docs_agent::{
    agent::{prompt::system_prompt, BillingAgent},
    config::AppConfig,
    document::DocumentGenerator,
    gemini::GeminiClient,
    tools::ToolRegistry,
};
use std::io::{BufRead, Write};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn print_agent_response(response: &str) {
    println!("\x1b[35m{}\x1b[0m", response);
}

/// Read stdin lines on a plain thread.
///
/// A blocked read there does not hold up runtime shutdown the way
/// `tokio::io::stdin` does, so Ctrl-C at the prompt exits at once.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });

    rx
}

async fn run(agent: &mut BillingAgent, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // A missing requisites file is fatal: the agent cannot work without it
    let requisites = agent.upload_file(&config.requisites_file).await?;
    let mut response = agent.invoke(&system_prompt(), &[requisites]).await?;

    let mut lines = spawn_stdin_reader();

    loop {
        print_agent_response(&response);

        let line = loop {
            print!("\nТы: ");
            std::io::stdout().flush()?;

            let Some(line) = lines.recv().await else {
                info!("Input closed");
                return Ok(());
            };
            if !line.trim().is_empty() {
                break line;
            }
        };

        response = match agent.invoke(line.trim(), &[]).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Agent turn failed");
                format!("Ошибка: {}", e)
            }
        };
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing; stdout is reserved for the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;

    if config.llm.api_key.is_empty() {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env");
    }

    let model = GeminiClient::new(config.llm.api_key.clone(), config.llm.model.clone())?;
    let registry = ToolRegistry::new(DocumentGenerator::from_config(&config.renderer));
    let mut agent =
        BillingAgent::new(Box::new(model), registry).with_temperature(config.llm.temperature);

    info!(
        session_id = %agent.session_id(),
        model = %config.llm.model,
        typst_root = %config.renderer.root_dir.display(),
        "Billing agent starting"
    );

    // Dropping the session future on Ctrl-C also kills a running compiler
    tokio::select! {
        result = run(&mut agent, &config) => result?,
        _ = tokio::signal::ctrl_c() => println!("\nдосвидули!"),
    }

    Ok(())
}
