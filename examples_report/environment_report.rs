use env_log_policy::env::{ENVIRONMENT_ENV, REGION_ENV};
use env_log_policy::{
    init_logging, ConfigurationProvider, EnvironmentResolver, ResolvedConfiguration,
};

fn main() {
    let service = "healthmate-core";

    println!("=== Environment configuration report ===\n");
    println!(
        "{}: {}",
        ENVIRONMENT_ENV,
        std::env::var(ENVIRONMENT_ENV).unwrap_or_else(|_| "<unset>".to_string())
    );
    println!(
        "{}: {}\n",
        REGION_ENV,
        std::env::var(REGION_ENV).unwrap_or_else(|_| "<unset>".to_string())
    );

    let handle = init_logging(service);

    let resolver = EnvironmentResolver::new();
    println!("--- Environment ---");
    println!("detected: {}", resolver.resolve());
    println!("production?: {}", resolver.is_production());
    println!("development?: {}", resolver.is_development());
    println!("staging?: {}\n", resolver.is_staging());

    let provider = ConfigurationProvider::new(service);
    println!("--- Naming ---");
    println!("service: {}", provider.service_name());
    println!("region: {}", provider.region());
    println!("suffix: '{}'", provider.environment_suffix());
    println!("stack: {}", provider.stack_name("Healthmate-CoreStack"));
    println!("stack: {}\n", provider.stack_name("Healthmate-HealthManagerStack"));

    println!("--- Logging ---");
    match handle.logger("report") {
        Some(logger) => {
            if let Some(controller) = handle.controller() {
                println!("level: {}", controller.level());
            }
            logger.debug("this is a DEBUG line");
            logger.info("this is an INFO line");
            logger.warning("this is a WARNING line");
            logger.error("this is an ERROR line");
        }
        None => println!("logging fell back to the minimal configuration"),
    }

    let snapshot = ResolvedConfiguration::create_for_service(service);
    println!("\n--- Snapshot ---");
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("could not serialize snapshot: {}", e),
    }
    if let Err(e) = snapshot.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
