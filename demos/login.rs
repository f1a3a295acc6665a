use stacklib::Stack;

fn env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        eprintln!("Set STACK_USERNAME, STACK_PASSWORD and STACK_HOSTNAME");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stack = Stack::new(
        &env("STACK_USERNAME"),
        &env("STACK_PASSWORD"),
        &env("STACK_HOSTNAME"),
    )?;

    println!("Logging in...");
    stack.login().await?;
    println!("Logged in, cwd is {}", stack.cwd());

    stack.logout().await;
    println!("Logged out");

    Ok(())
}
