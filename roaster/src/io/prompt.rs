//! Prompt rendering for the roast agent.

use anyhow::Result;
use minijinja::Environment;
use serde::Serialize;

use crate::io::config::RoasterConfig;

const ROAST_TEMPLATE: &str = include_str!("prompts/roast.md");
const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

/// Values substituted into the roast prompt.
#[derive(Debug, Clone, Serialize)]
pub struct RoastPromptInputs {
    pub handle: String,
    pub upstream_repo: String,
    pub content_dir: String,
    pub file_prefix: String,
    pub bot_author: String,
    pub tag: String,
}

impl RoastPromptInputs {
    pub fn from_config(handle: &str, cfg: &RoasterConfig) -> Self {
        Self {
            handle: handle.to_string(),
            upstream_repo: cfg.agent.upstream_repo.clone(),
            content_dir: cfg.repo.content_dir.display().to_string(),
            file_prefix: cfg.agent.file_prefix.clone(),
            bot_author: cfg.agent.bot_author.clone(),
            tag: cfg.agent.tag.clone(),
        }
    }
}

/// Rendered system prompt and user prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoastPrompt {
    pub system: String,
    pub user: String,
}

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("roast", ROAST_TEMPLATE)
            .expect("roast template should be valid");
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template should be valid");
        Self { env }
    }

    fn render(&self, name: &str, inputs: &RoastPromptInputs) -> Result<String> {
        let template = self.env.get_template(name)?;
        let rendered = template.render(inputs)?;
        Ok(rendered.trim().to_string())
    }
}

/// Render the prompts handed to the roast agent.
pub fn render_roast_prompt(inputs: &RoastPromptInputs) -> Result<RoastPrompt> {
    let engine = PromptEngine::new();
    Ok(RoastPrompt {
        system: engine.render("system", inputs)?,
        user: engine.render("roast", inputs)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> RoastPromptInputs {
        RoastPromptInputs::from_config("desertaxle", &RoasterConfig::default())
    }

    #[test]
    fn prompt_carries_the_output_contract() {
        let prompt = render_roast_prompt(&inputs()).expect("render");
        assert!(prompt.user.contains("roasting my (desertaxle) contributions to the PrefectHQ/prefect repo"));
        assert!(prompt.user.contains("@content/blog"));
        assert!(prompt.user.contains("prefix the filename with \"roast-\""));
        assert!(prompt.user.contains("Set the author as \"roast-bot\""));
        assert!(prompt.user.contains("`draft = false`"));
        assert!(prompt.user.contains("Add a \"roast\" tag"));
        assert!(prompt.user.contains("authorGitHubHandle = \"desertaxle\""));
    }

    #[test]
    fn steps_are_in_order() {
        let prompt = render_roast_prompt(&inputs()).expect("render");
        let find = prompt.user.find("Find ALL my merged PRs").expect("find step");
        let pick = prompt.user.find("Pick the most interesting PR").expect("pick step");
        let write = prompt.user.find("Write a blog post roasting the chosen PR").expect("write step");
        assert!(find < pick && pick < write);
    }

    #[test]
    fn system_prompt_is_rendered() {
        let prompt = render_roast_prompt(&inputs()).expect("render");
        assert!(prompt.system.starts_with("You are a blog post writer."));
    }
}
