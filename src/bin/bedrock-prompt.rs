//! Send one prompt to a Bedrock model from the command line

use std::io::Write;

use bedrock_invoke::{Adapter, BedrockClient, GatewayConfig, PromptRequest};
use clap::Parser;
use futures::StreamExt;
use log::{error, info};

#[derive(Debug, Parser)]
#[command(name = "bedrock-prompt", about = "Send a prompt to an Amazon Bedrock model")]
struct Args
{   /// The prompt text
    prompt: String
  , /// Model identifier, e.g. anthropic.claude-3-sonnet-20240229-v1:0
    #[arg(short, long, default_value = "anthropic.claude-v2")]
    model: String
  , /// AWS region (defaults to AWS_REGION or us-east-1)
    #[arg(short, long)]
    region: Option<String>
  , #[arg(long, default_value_t = 500)]
    max_tokens: u32
  , #[arg(long, default_value_t = 1.0)]
    temperature: f64
  , /// System instruction (Claude messages models)
    #[arg(long)]
    system: Option<String>
  , /// File whose contents are placed before the prompt
    #[arg(long)]
    document: Option<std::path::PathBuf>
  , /// Print the response as it is generated
    #[arg(short, long)]
    stream: bool
}

#[tokio::main]
async fn main()
{   env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args).await
    {   error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>>
{   let mut config = GatewayConfig::from_env();
    if let Some(region) = args.region
    {   config = config.with_region(region);
    }
    let client = BedrockClient::from_config(&config)?;

    let mut request = PromptRequest::new(args.prompt)
      .with_max_tokens(args.max_tokens)
      .with_temperature(args.temperature);
    if let Some(system) = args.system
    {   request = request.with_system(system);
    }
    if let Some(path) = args.document
    {   request = request.with_document(std::fs::read_to_string(path)?);
    }

    let adapter = Adapter::for_model(&args.model)?;
    info!("Sending prompt to {}", adapter.name());

    if args.stream
    {   let mut stream = client.send_streaming(&args.model, &request).await?;
        let mut stdout = std::io::stdout();
        while let Some(delta) = stream.next().await
        {   write!(stdout, "{}", delta?)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
    } else if adapter.supports_image()
      && !adapter.supports_text()
    {   let image = client.send_image(&args.model, &request).await?;
        let file_name = format!(
          "{}.png",
          chrono::Utc::now().format("%Y%m%d%H%M%S")
        );
        std::fs::write(&file_name, image)?;
        println!("Image written to {}", file_name);
    } else
    {   println!("{}", client.send_text(&args.model, &request).await?);
    }

    Ok(())
}
