//! Human and JSON renderings of daemon responses.

use pgdb_core::{DeployResult, StatusSnapshot};

pub fn print_deploy(result: &DeployResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("✓ Deployed {}", result.name);
    println!("  host: {}", result.host);
    println!("  port: {}", result.port);
    println!("  db: {}", result.db);
    println!("  user: {}", result.user);
    println!("  password: {}", result.password);
    println!("  DATABASE_URL: {}", result.database_url);
    Ok(())
}

pub fn print_status(snapshot: &StatusSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    if snapshot.items.is_empty() {
        println!("No databases found.");
        return Ok(());
    }
    for item in &snapshot.items {
        println!("{} (postgres {})", item.name, item.postgres_version);
        println!("  host: {}", item.host);
        println!("  port: {}", item.host_port);
        println!("  db: {}", item.db);
        println!("  user: {}", item.user);
        println!("  created_at: {}", item.created_at);
        println!("  DATABASE_URL: {}", item.database_url);
    }
    Ok(())
}

pub fn print_destroy(name: &str, json: bool) -> anyhow::Result<()> {
    if json {
        let body = serde_json::json!({ "name": name, "ok": true });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    println!("✓ Destroyed {name}");
    Ok(())
}
