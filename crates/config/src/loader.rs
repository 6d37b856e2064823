use std::{fmt::Write, path::Path, str::FromStr};

use anyhow::bail;
use indoc::indoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;

use crate::{Config, RegistryConfig};

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let mut raw_config: Value = toml::from_str(&content)?;

    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;
    validate(&config)?;

    if config.relay.streaming_models.is_some() {
        log::debug!("Using the configured streaming model list instead of the built-in one");
    }

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    if !config.server.path.starts_with('/') {
        bail!("server.path must start with '/', got '{}'", config.server.path);
    }

    if config.server.health.enabled && !config.server.health.path.starts_with('/') {
        bail!("server.health.path must start with '/', got '{}'", config.server.health.path);
    }

    if config.server.health.enabled && config.server.health.path == config.server.path {
        bail!("server.health.path must differ from server.path '{}'", config.server.path);
    }

    if config.relay.default_max_tokens == 0 {
        bail!("relay.default_max_tokens must be a positive integer");
    }

    if config.relay.default_temperature.is_nan() || config.relay.default_temperature < 0.0 {
        bail!(
            "relay.default_temperature must be non-negative, got {}",
            config.relay.default_temperature
        );
    }

    if config.relay.timeout.is_zero() {
        bail!("relay.timeout must be greater than zero");
    }

    if let Some(models) = &config.relay.streaming_models
        && models.is_empty()
    {
        bail!(indoc! {r#"
            relay.streaming_models is empty, so no model could ever be streamed.

            Either remove the key to use the built-in list, or name the models to allow:

              [relay]
              streaming_models = ["anthropic.claude-3-haiku-20240307-v1:0"]
        "#});
    }

    if let RegistryConfig::Redis(redis) = &config.registry
        && !(redis.url.starts_with("redis://") || redis.url.starts_with("rediss://"))
    {
        bail!("registry.url must use the redis:// or rediss:// scheme, got '{}'", redis.url);
    }

    Ok(())
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();

                for segment in path.iter() {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]")?,
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                bail!("Failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
