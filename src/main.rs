use clap::Parser;
use deploy_topology::utils::{logger, validation::Validate};
use deploy_topology::{
    CliConfig, OutputFormat, PlanOutput, ResolvedTopology, TopologyConfig, TopologyEngine,
    TopologyError,
};

fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting deploy-topology");
    tracing::info!("📁 Loading topology from: {}", args.config);
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let config = match TopologyConfig::from_file(&args.config) {
        Ok(config) => config.with_region(args.region.clone()),
        Err(e) => fail(&e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    let engine = TopologyEngine::new(config);
    let topology = match engine.resolve() {
        Ok(topology) => topology,
        Err(e) => {
            tracing::error!(
                "❌ Topology resolution failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            fail(&e);
        }
    };

    if args.dry_run {
        println!(
            "✅ Topology for {} resolved: {} project(s)",
            topology.region,
            topology.projects.len()
        );
        return Ok(());
    }

    if let Some(path) = &args.output {
        match PlanOutput::new(path).write(&topology) {
            Ok(written) => tracing::info!("📁 Plan saved to: {}", written.display()),
            Err(e) => fail(&e),
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&topology.plan())?),
        OutputFormat::Summary => display_summary(&topology),
    }

    Ok(())
}

/// 輸出錯誤並依嚴重程度結束程序
fn fail(e: &TopologyError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

fn display_summary(topology: &ResolvedTopology) {
    println!("📋 Topology Summary ({})", topology.region);

    for project in &topology.projects {
        println!();
        println!("  {} [{}]", project.name, project.components.join(", "));

        for (deploy_env, meta) in &project.catalog {
            println!(
                "    {:<12} {:<9} compute {}..{}  cache {} x{}{}",
                deploy_env,
                meta.env_type.to_string(),
                meta.compute.min,
                meta.compute.max,
                meta.cache.node_type,
                meta.cache.replicas,
                meta.multi_region_token
                    .as_deref()
                    .map(|t| format!("  token {}", t))
                    .unwrap_or_default()
            );
        }

        let always_on = topology
            .set_24x7(&project.name)
            .map(|set| set.iter().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        println!("    24/7: prod{}{}", if always_on.is_empty() { "" } else { ", " }, always_on);
        if let Some(weekend) = topology.set_weekend(&project.name) {
            println!(
                "    weekend: {}",
                weekend.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        if let Some(database) = &project.database {
            for server in &database.servers {
                println!(
                    "    db {:<14} {:<14} [{}]",
                    server.id,
                    server.instance_type,
                    server.members.join(", ")
                );
            }
        }
    }

    println!();
    println!("🗓️ Stack Schedules:");
    for stack in topology.stack_schedules() {
        println!(
            "  {}/{}/{}: {:?}",
            stack.project, stack.component, stack.deploy_env, stack.kind
        );
    }
    for server in topology.server_schedules() {
        println!(
            "  {}/db/{}: {:?}",
            server.project, server.server, server.kind
        );
    }
}
