//! Accumulator-loop demo: a step that revisits itself until a counter
//! reaches its target, then reports the final context.
//!
//! Run with: cargo run --example counter

use apl::{RunOptions, start};

const SOURCE: &str = "\
# pre: count
inc('n')
# prompt: count
## user
We are at {{ get('n') }} of 5.
# post: count
if get('n') < 5
    set('next_step', 'count')
endif
";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let context = start(SOURCE, RunOptions::new()).await?;

    println!("steps executed: {}", context.history.len());
    println!("final counter:  {:?}", context.get_value("n"));
    println!("last reply:     {}", context.result_text);
    Ok(())
}
