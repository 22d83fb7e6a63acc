//! Deployed endpoint handler

use futures::StreamExt;

use crate::api::EndpointClient;
use crate::cli::output::print_info;
use crate::models::ChatRequest;
use crate::rag::ContextAssembler;
use crate::AppConfig;
use crate::Result;

pub async fn handle_invoke(
    config: &AppConfig,
    url: String,
    token: Option<String>,
    query: String,
    stream: bool,
) -> Result<()> {
    print_info(&format!("Invoking {url}"));
    print_info(&format!("Query: \"{query}\""));

    let client = EndpointClient::with_timeout(url, token, config.request_timeout())?;
    let request = ChatRequest::new(query);

    if stream {
        let mut lines = client.invoke_stream(&request).await?;
        while let Some(line) = lines.next().await {
            println!("{}", line?);
        }
    } else {
        let response = client.invoke(&request).await?;
        println!("\n{}", response.reply.trim());
        println!();
        print!("{}", ContextAssembler::new().create_summary(&response.context));
    }

    Ok(())
}
