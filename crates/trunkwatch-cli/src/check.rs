use anyhow::Context;
use std::io::Read;
use trunkwatch_core::engine::extract::extract;

pub fn run(text: Option<String>) -> anyhow::Result<()> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    match extract(text.trim_end(), chrono::Utc::now()) {
        Some(fact) => println!("{}", serde_json::to_string_pretty(&fact)?),
        None => println!("not a glove box / trunk log (or missing actor/action)"),
    }
    Ok(())
}
