use anyhow::{anyhow, Context};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use stowage_store::{
    EventStream, ListStoreEvent, ProviderConfig, StoreProvider, ValueStoreEvent,
};

use crate::cli::*;

const KEY_SINGLE_DINO: &str = "dino";
const KEY_MULTI_DINOS: &str = "dinoList";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let provider = open_provider(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Get(args) => cmd_get(&provider, &args.key, format),
        Command::Put(args) => cmd_put(&provider, args, format),
        Command::Clear(args) => {
            provider.value_store::<Value>(&args.key)?.clear()?;
            print_status(format, &args.key, "cleared");
            Ok(())
        }
        Command::Delete(args) => {
            provider.value_store::<Value>(&args.key)?.delete()?;
            print_status(format, &args.key, "deleted");
            Ok(())
        }
        Command::List(args) => cmd_list(&provider, args.action, format),
        Command::Demo(args) => cmd_demo(&provider, args, format),
        Command::Keys => cmd_keys(&provider, format),
    }
}

fn open_provider(cli: &Cli) -> anyhow::Result<StoreProvider> {
    let mut config = match &cli.config {
        Some(path) => ProviderConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProviderConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    debug!(root = %config.root.display(), "opening stores");
    Ok(StoreProvider::from_config(&config)?)
}

fn parse_json(source: &str) -> anyhow::Result<Value> {
    serde_json::from_str(source).with_context(|| format!("invalid JSON: {source}"))
}

fn print_json(value: &Value, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
    }
    Ok(())
}

fn print_list(list: Vec<Value>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text if list.is_empty() => println!("{}", "(empty list)".dimmed()),
        OutputFormat::Text => {
            for (index, item) in list.iter().enumerate() {
                println!("{:>3}  {}", index.to_string().yellow(), serde_json::to_string(item)?);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&list)?),
    }
    Ok(())
}

fn print_status(format: OutputFormat, key: &str, action: &str) {
    match format {
        OutputFormat::Text => println!("{} {} {}", "✓".green().bold(), action, key.bold()),
        OutputFormat::Json => println!("{}", json!({ "key": key, "status": action })),
    }
}

fn cmd_get(provider: &StoreProvider, key: &str, format: OutputFormat) -> anyhow::Result<()> {
    let value = provider.value_store::<Value>(key)?.get()?;
    print_json(&value, format)
}

fn cmd_put(provider: &StoreProvider, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let value = parse_json(&args.value)?;
    let stored = provider.value_store::<Value>(&args.key)?.put(value)?;
    match format {
        OutputFormat::Text => print_status(format, &args.key, "stored"),
        OutputFormat::Json => print_json(&stored, format)?,
    }
    Ok(())
}

fn cmd_list(provider: &StoreProvider, action: ListAction, format: OutputFormat) -> anyhow::Result<()> {
    let result = match action {
        ListAction::Get { key } => provider.list_store::<Value>(&key)?.get()?,
        ListAction::Put { key, values } => {
            let values: Vec<Value> = serde_json::from_str(&values)
                .with_context(|| format!("expected a JSON array: {values}"))?;
            provider.list_store::<Value>(&key)?.put(values)?
        }
        ListAction::Add { key, value } => {
            provider.list_store::<Value>(&key)?.add_to_list(parse_json(&value)?)?
        }
        ListAction::Remove { key, value } => {
            provider.list_store::<Value>(&key)?.remove_from_list(&parse_json(&value)?)?
        }
        ListAction::RemoveAt { key, index } => provider.list_store::<Value>(&key)?.remove_at(index)?,
        ListAction::Upsert { key, value, by } => {
            let value = parse_json(&value)?;
            let wanted = value
                .get(&by)
                .cloned()
                .ok_or_else(|| anyhow!("value has no field `{by}`"))?;
            provider
                .list_store::<Value>(&key)?
                .add_or_replace(value, |item| item.get(&by) == Some(&wanted))?
        }
        ListAction::Clear { key } => {
            provider.list_store::<Value>(&key)?.clear()?;
            print_status(format, &key, "cleared");
            return Ok(());
        }
        ListAction::Delete { key } => {
            provider.list_store::<Value>(&key)?.delete()?;
            print_status(format, &key, "deleted");
            return Ok(());
        }
    };
    print_list(result, format)
}

fn cmd_keys(provider: &StoreProvider, format: OutputFormat) -> anyhow::Result<()> {
    let keys = provider.stored_keys()?;
    match format {
        OutputFormat::Text if keys.is_empty() => {
            println!("No stores in {}.", provider.root().display().to_string().bold())
        }
        OutputFormat::Text => {
            for key in &keys {
                println!("{key}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&keys)?),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Demo session
// ---------------------------------------------------------------------------

fn cmd_demo(provider: &StoreProvider, args: DemoArgs, format: OutputFormat) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_demo(provider.clone(), args.keep, format))
}

async fn run_demo(provider: StoreProvider, keep: bool, format: OutputFormat) -> anyhow::Result<()> {
    let dino = provider.value_store::<Value>(KEY_SINGLE_DINO)?;
    let dinos = provider.list_store::<Value>(KEY_MULTI_DINOS)?;
    let mut dino_events = dino.events();
    let mut list_events = dinos.events();

    dino.observe_put(json!({ "name": "Rex", "arm_length": 4 })).await?;
    print_value_event(KEY_SINGLE_DINO, &next_event(&mut dino_events).await?, format)?;

    for (name, arm_length) in [("Blue", 2), ("Charlie", 3), ("Delta", 5)] {
        dinos
            .observe_add_to_list(json!({ "name": name, "arm_length": arm_length }))
            .await?;
        print_list_event(KEY_MULTI_DINOS, &next_event(&mut list_events).await?, format)?;
    }

    let last = dinos.observe_get().await?.len().saturating_sub(1);
    dinos.observe_remove_at(last).await?;
    print_list_event(KEY_MULTI_DINOS, &next_event(&mut list_events).await?, format)?;

    dinos
        .observe_add_or_replace(json!({ "name": "Blue", "arm_length": 6 }), |d| {
            d["name"] == "Blue"
        })
        .await?;
    print_list_event(KEY_MULTI_DINOS, &next_event(&mut list_events).await?, format)?;

    if keep {
        return Ok(());
    }

    dinos.observe_clear().await?;
    print_list_event(KEY_MULTI_DINOS, &next_event(&mut list_events).await?, format)?;

    dino.observe_delete().await?;
    dinos.observe_delete().await?;
    print_value_event(KEY_SINGLE_DINO, &next_event(&mut dino_events).await?, format)?;
    print_list_event(KEY_MULTI_DINOS, &next_event(&mut list_events).await?, format)?;

    if dino_events.next().await.is_none() && list_events.next().await.is_none() {
        print_status(format, "dino streams", "completed");
    }
    Ok(())
}

async fn next_event<E: Clone>(events: &mut EventStream<E>) -> anyhow::Result<E> {
    let key = events.key().to_string();
    events
        .next()
        .await
        .ok_or_else(|| anyhow!("event stream for `{key}` closed early"))
}

fn print_value_event(key: &str, event: &ValueStoreEvent<Value>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let payload = match event.item() {
                Some(item) => serde_json::to_string(item)?,
                None => String::new(),
            };
            println!("{} {} {}", key.bold(), event.kind().to_string().cyan(), payload);
        }
        OutputFormat::Json => {
            println!("{}", json!({ "key": key, "event": event.kind().to_string(), "value": event.item() }));
        }
    }
    Ok(())
}

fn print_list_event(key: &str, event: &ListStoreEvent<Value>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let payload = match event.list() {
                Some(list) => serde_json::to_string(list)?,
                None => String::new(),
            };
            println!("{} {} {}", key.bold(), event.kind().to_string().cyan(), payload);
        }
        OutputFormat::Json => {
            println!("{}", json!({ "key": key, "event": event.kind().to_string(), "value": event.list() }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(root: &std::path::Path, args: &[&str]) -> anyhow::Result<()> {
        let root = root.to_str().unwrap();
        let mut argv = vec!["stowage", "--root", root];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn provider_at(root: &std::path::Path) -> StoreProvider {
        StoreProvider::builder(root)
            .using(stowage_store::JsonConverter::new())
            .unwrap()
    }

    #[test]
    fn put_then_get_value() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["put", "dino", r#"{"name":"Rex","arm_length":4}"#]).unwrap();
        run(dir.path(), &["get", "dino"]).unwrap();

        let stored = provider_at(dir.path()).value_store::<Value>("dino").unwrap().get().unwrap();
        assert_eq!(stored["name"], "Rex");
    }

    #[test]
    fn get_missing_value_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["get", "nothing"]).is_err());
    }

    #[test]
    fn put_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path(), &["put", "dino", "{not json"]).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn list_commands_modify_the_list() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["list", "put", "dinoList", r#"[{"name":"A"},{"name":"B"}]"#]).unwrap();
        run(dir.path(), &["list", "add", "dinoList", r#"{"name":"C"}"#]).unwrap();
        run(dir.path(), &["list", "remove-at", "dinoList", "0"]).unwrap();
        run(dir.path(), &["list", "upsert", "dinoList", r#"{"name":"B","arm_length":9}"#, "--by", "name"])
            .unwrap();
        run(dir.path(), &["list", "remove", "dinoList", r#"{"name":"C"}"#]).unwrap();

        let list = provider_at(dir.path()).list_store::<Value>("dinoList").unwrap().get().unwrap();
        assert_eq!(list, vec![json!({ "name": "B", "arm_length": 9 })]);
    }

    #[test]
    fn upsert_requires_the_field() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["list", "upsert", "dinoList", r#"{"name":"B"}"#, "--by", "id"]).is_err());
    }

    #[test]
    fn remove_at_out_of_range_fails() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["list", "put", "dinoList", "[1]"]).unwrap();
        assert!(run(dir.path(), &["list", "remove-at", "dinoList", "3"]).is_err());
    }

    #[test]
    fn delete_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["put", "dino", "1"]).unwrap();
        run(dir.path(), &["delete", "dino"]).unwrap();
        assert!(provider_at(dir.path()).stored_keys().unwrap().is_empty());
    }

    #[test]
    fn demo_cleans_up_after_itself() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["demo"]).unwrap();
        assert!(provider_at(dir.path()).stored_keys().unwrap().is_empty());
    }

    #[test]
    fn demo_keep_leaves_stores() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["--format", "json", "demo", "--keep"]).unwrap();

        let provider = provider_at(dir.path());
        assert_eq!(
            provider.stored_keys().unwrap(),
            vec![KEY_SINGLE_DINO.to_string(), KEY_MULTI_DINOS.to_string()]
        );
        let dinos = provider.list_store::<Value>(KEY_MULTI_DINOS).unwrap().get().unwrap();
        assert_eq!(
            dinos,
            vec![
                json!({ "name": "Blue", "arm_length": 6 }),
                json!({ "name": "Charlie", "arm_length": 3 }),
            ]
        );
    }

    #[test]
    fn missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("absent.toml");
        assert!(run(dir.path(), &["keys", "--config", config.to_str().unwrap()]).is_err());
    }
}
