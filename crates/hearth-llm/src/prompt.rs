//! Prompt template loading and rendering via `minijinja`.
//!
//! Each tick stage owns a system template and a user template. The built-in
//! set is compiled into the binary from `templates/`; an operator can point
//! `TEMPLATES_DIR` at a directory holding any subset of the same file names
//! (`<stage>.system.j2`, `<stage>.user.j2`) to tune the prompts without
//! recompiling.

use std::path::Path;

use minijinja::Environment;

use crate::error::PromptError;

/// The prompt-producing stages of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Council proposal for a new building.
    Governance,
    /// One agent's intent for the tick.
    Intent,
    /// NPC task assignment and world events.
    Arbitration,
    /// Weather and scene description.
    Environment,
    /// The tick's short narrative.
    Story,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Governance,
        Self::Intent,
        Self::Arbitration,
        Self::Environment,
        Self::Story,
    ];

    /// Template file stem.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Governance => "governance",
            Self::Intent => "intent",
            Self::Arbitration => "arbitration",
            Self::Environment => "environment",
            Self::Story => "story",
        }
    }

    const fn builtin(self) -> (&'static str, &'static str) {
        match self {
            Self::Governance => (
                include_str!("../templates/governance.system.j2"),
                include_str!("../templates/governance.user.j2"),
            ),
            Self::Intent => (
                include_str!("../templates/intent.system.j2"),
                include_str!("../templates/intent.user.j2"),
            ),
            Self::Arbitration => (
                include_str!("../templates/arbitration.system.j2"),
                include_str!("../templates/arbitration.user.j2"),
            ),
            Self::Environment => (
                include_str!("../templates/environment.system.j2"),
                include_str!("../templates/environment.user.j2"),
            ),
            Self::Story => (
                include_str!("../templates/story.system.j2"),
                include_str!("../templates/story.user.j2"),
            ),
        }
    }
}

/// A rendered prompt ready to send to a generation backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the role.
    pub system: String,
    /// User message carrying the stage context.
    pub user: String,
    /// Ask the backend for strictly structured (JSON) output. Every stage
    /// template asks for one JSON object, so rendered prompts set this.
    pub structured: bool,
}

/// Manages prompt template loading and rendering.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Engine with only the compiled-in templates.
    pub fn builtin() -> Result<Self, PromptError> {
        Self::new(None)
    }

    /// Engine with compiled-in templates, overridden by any matching files
    /// found in `templates_dir`.
    pub fn new(templates_dir: Option<&str>) -> Result<Self, PromptError> {
        let mut env = Environment::new();

        for stage in Stage::ALL {
            let (system, user) = stage.builtin();
            let system = load_override(templates_dir, stage, "system")?
                .unwrap_or_else(|| system.to_owned());
            let user =
                load_override(templates_dir, stage, "user")?.unwrap_or_else(|| user.to_owned());

            env.add_template_owned(template_name(stage, "system"), system)
                .map_err(|e| PromptError(format!("failed to add {} system template: {e}", stage.as_str())))?;
            env.add_template_owned(template_name(stage, "user"), user)
                .map_err(|e| PromptError(format!("failed to add {} user template: {e}", stage.as_str())))?;
        }

        Ok(Self { env })
    }

    /// Render the prompt for `stage` from a JSON context.
    pub fn render(
        &self,
        stage: Stage,
        context: &serde_json::Value,
    ) -> Result<RenderedPrompt, PromptError> {
        let system = self.render_part(stage, "system", context)?;
        let user = self.render_part(stage, "user", context)?;
        Ok(RenderedPrompt {
            system,
            user,
            structured: true,
        })
    }

    fn render_part(
        &self,
        stage: Stage,
        part: &str,
        context: &serde_json::Value,
    ) -> Result<String, PromptError> {
        let name = template_name(stage, part);
        self.env
            .get_template(&name)
            .map_err(|e| PromptError(format!("missing {name} template: {e}")))?
            .render(context)
            .map_err(|e| PromptError(format!("{name} render failed: {e}")))
    }
}

fn template_name(stage: Stage, part: &str) -> String {
    format!("{}.{part}", stage.as_str())
}

/// Read `<dir>/<stage>.<part>.j2` if the directory and file exist.
fn load_override(
    dir: Option<&str>,
    stage: Stage,
    part: &str,
) -> Result<Option<String>, PromptError> {
    let Some(dir) = dir else {
        return Ok(None);
    };
    let path = Path::new(dir).join(format!("{}.{part}.j2", stage.as_str()));
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| PromptError(format!("failed to read {}: {e}", path.display())))
}
