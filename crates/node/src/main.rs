mod cli;

use cli::args::{Args, Parser};
use cli::op::OpContext;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let ctx = OpContext::new(args.config_path, args.api_url);

    match args.command.execute(&ctx).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
