use stacklib::{Order, Stack};

fn env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        eprintln!("Set STACK_USERNAME, STACK_PASSWORD and STACK_HOSTNAME");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());

    let mut stack = Stack::new(
        &env("STACK_USERNAME"),
        &env("STACK_PASSWORD"),
        &env("STACK_HOSTNAME"),
    )?;
    stack.login().await?;

    for node in stack.ls(Some(&path), Order::Ascending).await? {
        let kind = if node.is_dir() { "dir " } else { "file" };
        println!("{} {:>12} {}", kind, node.size(), node.path());
    }

    stack.logout().await;
    Ok(())
}
