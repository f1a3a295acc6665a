use stacklib::Stack;

fn env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        eprintln!("Set STACK_USERNAME, STACK_PASSWORD and STACK_HOSTNAME");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let local = args.next().unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example upload -- <LOCAL_FILE> [REMOTE_DIR]");
        std::process::exit(1);
    });
    let remote_dir = args.next();

    let mut stack = Stack::new(
        &env("STACK_USERNAME"),
        &env("STACK_PASSWORD"),
        &env("STACK_HOSTNAME"),
    )?;

    println!("Logging in...");
    stack.login().await?;

    println!("Uploading {}...", local);
    let node = stack.upload_as(&local, remote_dir.as_deref(), None).await?;
    println!("Uploaded to {} ({} bytes)", node.path(), node.size());

    stack.logout().await;
    Ok(())
}
