use serde_json::json;
use streamlinks::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let content_id = args.next().unwrap_or_else(|| "tt0133093".to_string());
    let kind = args.next().unwrap_or_else(|| "movie".to_string());

    let mut params = RequestParams::new(content_id, kind);
    params.season = args.next();
    params.episode = args.next();
    let spec = params.validate(EpisodePolicy::Lenient)?;

    let client = StreamsBuilder::new().build()?;

    for (id, url) in client.resolve_endpoints(&spec) {
        println!("{id}: {url}");
    }

    let streams = client.aggregate(&spec).await?;
    println!("{:#}", json!({ "streams": streams }));
    Ok(())
}
