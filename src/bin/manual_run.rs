use aster_service::executor::AsterExecutor;
use aster_service::generator::CommandGenerator;
use aster_service::models::AnalysisRequest;
use aster_service::registry::LoadRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let request_path = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("sample_study.json");

    let json = std::fs::read_to_string(request_path)?;
    let request: AnalysisRequest = serde_json::from_str(&json)?;

    let registry = LoadRegistry::new();
    let generator = CommandGenerator::new();
    let comm = generator.generate_comm(&registry, &request.model)?;

    if request.use_mock {
        println!("{}", comm);
        return Ok(());
    }

    let mut executor = AsterExecutor::new();
    let outcome = executor.execute(&comm).await?;

    println!("succeeded: {}", outcome.succeeded);
    println!("{}", serde_json::to_string_pretty(&outcome.diagnostics)?);
    Ok(())
}
