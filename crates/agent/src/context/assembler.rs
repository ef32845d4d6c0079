//! Prompt assembly for the intent service.
//!
//! The prompt always has the same four sections, in this order:
//!
//! 1. **Profile** (persona and standing context), loaded once at construction
//! 2. **Tool manifest** (one line per registered tool), built once and cached
//! 3. **Conversation history** (the session's bounded log)
//! 4. **Current utterance**
//!
//! Sections 1 and 2 go into the system context; 3 and 4 into the user text.
//!
//! # Determinism
//!
//! Identical inputs always produce identical prompts. Nothing random or
//! time-dependent goes into assembly, and the manifest is sorted by tool name.

use std::sync::{Arc, RwLock, Weak};
use tracing::debug;
use umbra_core::decision::{RESERVED_CONVERSATION, RESERVED_ERROR};
use umbra_core::identity::ProfileSupplier;
use umbra_core::message::ConversationLog;
use umbra_core::tool::ToolRegistry;

pub const TOOLS_HEADING: &str = "--- AVAILABLE TOOLS ---";
pub const HISTORY_HEADING: &str = "--- Recent Conversation History ---";
pub const PROMPT_HEADING: &str = "--- Current Prompt ---";

/// How the model must answer; appended after the manifest.
const RESPONSE_FORMAT: &str = "Respond with a single JSON object and nothing else:\n\
{\"thought\": \"<brief reasoning>\", \"decision\": {\"tool\": \"<tool name>\", \"args\": [\"<arg>\", ...]}}\n\
Pass exactly as many args as the tool takes. \
When no tool fits, use the \"conversation\" tool with your reply as its only argument.";

/// The assembled prompt, split the way providers take it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    /// Profile, tool manifest and response format.
    pub system_context: String,
    /// History (when there is any) and the current utterance.
    pub user_text: String,
}

impl AssembledPrompt {
    /// The whole prompt as one string.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.system_context, self.user_text)
    }
}

/// Builds prompts from the profile, the registry, the history and an utterance.
///
/// The profile text and the manifest are cached; `reload()` re-reads the
/// profile and drops the manifest so the next assembly rebuilds it. The
/// manifest is tied to the registry it was built from and is rebuilt
/// whenever a different registry is passed in.
pub struct ContextAssembler {
    supplier: Arc<dyn ProfileSupplier>,
    profile: RwLock<Arc<str>>,
    manifest: RwLock<Option<CachedManifest>>,
}

/// A manifest plus the registry it describes. The `Weak` keeps the
/// registry's allocation reserved, so its address cannot be reused by a
/// later registry while this entry exists.
struct CachedManifest {
    registry: Weak<ToolRegistry>,
    text: Arc<str>,
}

impl CachedManifest {
    fn describes(&self, registry: &Arc<ToolRegistry>) -> bool {
        std::ptr::eq(self.registry.as_ptr(), Arc::as_ptr(registry))
    }
}

impl ContextAssembler {
    pub fn new(supplier: Arc<dyn ProfileSupplier>) -> Self {
        let profile: Arc<str> = supplier.load().into();
        Self {
            supplier,
            profile: RwLock::new(profile),
            manifest: RwLock::new(None),
        }
    }

    /// Re-read the profile and forget the cached manifest.
    ///
    /// Calling it twice in a row leaves the assembler in the same state as
    /// calling it once.
    pub fn reload(&self) {
        let fresh: Arc<str> = self.supplier.load().into();
        *self.profile.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        *self.manifest.write().unwrap_or_else(|e| e.into_inner()) = None;
        debug!("Context assembler reloaded");
    }

    pub fn profile(&self) -> Arc<str> {
        self.profile.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The manifest for `registry`, served from cache while the same
    /// registry keeps being passed in.
    pub fn manifest(&self, registry: &Arc<ToolRegistry>) -> Arc<str> {
        if let Some(cached) = self.manifest.read().unwrap_or_else(|e| e.into_inner()).as_ref()
            && cached.describes(registry)
        {
            return cached.text.clone();
        }

        let text: Arc<str> = build_manifest(registry).into();
        let mut slot = self.manifest.write().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(cached) if cached.describes(registry) => cached.text.clone(),
            _ => {
                *slot = Some(CachedManifest {
                    registry: Arc::downgrade(registry),
                    text: text.clone(),
                });
                text
            }
        }
    }

    pub fn assemble(
        &self,
        registry: &Arc<ToolRegistry>,
        history: &ConversationLog,
        utterance: &str,
    ) -> AssembledPrompt {
        let profile = self.profile();
        let manifest = self.manifest(registry);

        let system_context = format!(
            "{}\n\n{TOOLS_HEADING}\n{manifest}\n\n{RESPONSE_FORMAT}",
            profile.trim_end()
        );

        let user_text = if history.is_empty() {
            format!("{PROMPT_HEADING}\n{utterance}")
        } else {
            format!(
                "{HISTORY_HEADING}\n{}\n\n{PROMPT_HEADING}\n{utterance}",
                history.render()
            )
        };

        AssembledPrompt {
            system_context,
            user_text,
        }
    }
}

/// Registered tools sorted by name, then the two reserved names.
fn build_manifest(registry: &ToolRegistry) -> String {
    let mut lines: Vec<String> = registry.descriptors().map(|d| d.manifest_line()).collect();
    lines.push(format!(
        "- {RESERVED_CONVERSATION} (1 argument): Reply to the user directly in plain words."
    ));
    lines.push(format!(
        "- {RESERVED_ERROR} (1 argument): Report that the request cannot be handled, with the reason."
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use umbra_core::identity::StaticProfile;
    use umbra_core::tool::{Arity, FnTool};

    fn registry(names: &[&str]) -> Arc<ToolRegistry> {
        let mut builder = ToolRegistry::builder();
        for name in names {
            builder
                .register_tool(FnTool::new(*name, Arity::Exact(1), "test tool", |_| Ok(None)))
                .unwrap();
        }
        Arc::new(builder.build())
    }

    fn assembler(text: &str) -> ContextAssembler {
        ContextAssembler::new(Arc::new(StaticProfile::new(text)))
    }

    /// Hands out "profile v1", "profile v2", ... on each load.
    struct CountingProfile(AtomicUsize);

    impl ProfileSupplier for CountingProfile {
        fn load(&self) -> String {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            format!("profile v{n}")
        }
    }

    #[test]
    fn sections_come_in_fixed_order() {
        let mut history = ConversationLog::default();
        history.append_exchange("hi", "Hello!");

        let prompt = assembler("You are Umbra.").assemble(
            &registry(&["weather"]),
            &history,
            "weather in Boston",
        );
        let full = prompt.render();

        let profile = full.find("You are Umbra.").unwrap();
        let tools = full.find(TOOLS_HEADING).unwrap();
        let weather = full.find("- weather (1 argument): test tool").unwrap();
        let past = full.find("User: hi\nAssistant: Hello!").unwrap();
        let current = full.find("weather in Boston").unwrap();
        assert!(profile < tools && tools < weather && weather < past && past < current);
    }

    #[test]
    fn empty_history_has_no_history_section() {
        let prompt = assembler("p").assemble(&registry(&[]), &ConversationLog::default(), "hello");
        assert_eq!(prompt.user_text, format!("{PROMPT_HEADING}\nhello"));
        assert!(!prompt.render().contains(HISTORY_HEADING));
    }

    #[test]
    fn identical_inputs_give_identical_prompts() {
        let a = assembler("p");
        let reg = registry(&["b-tool", "a-tool"]);
        let log = ConversationLog::default();
        assert_eq!(a.assemble(&reg, &log, "x"), a.assemble(&reg, &log, "x"));
        let manifest = a.manifest(&reg);
        assert!(manifest.find("a-tool").unwrap() < manifest.find("b-tool").unwrap());
    }

    #[test]
    fn manifest_lists_reserved_names() {
        let manifest = assembler("p").manifest(&registry(&[]));
        assert!(manifest.contains("- conversation (1 argument)"));
        assert!(manifest.contains("- error (1 argument)"));
    }

    #[test]
    fn manifest_is_cached_per_registry() {
        let a = assembler("p");
        let weather = registry(&["weather"]);
        let first = a.manifest(&weather);
        assert!(Arc::ptr_eq(&a.manifest(&weather), &first));

        a.reload();
        let rebuilt = a.manifest(&weather);
        assert_eq!(rebuilt, first);
        assert!(!Arc::ptr_eq(&rebuilt, &first));
    }

    #[test]
    fn stale_registry_cannot_pin_its_manifest() {
        let a = assembler("p");
        let old = registry(&["weather"]);
        let new = registry(&["distance"]);

        // A turn that snapshotted `old` assembles after the swap to `new`.
        a.reload();
        assert!(a.manifest(&old).contains("weather"));

        let advertised = a.manifest(&new);
        assert!(advertised.contains("distance"));
        assert!(!advertised.contains("weather"));
        assert!(a.assemble(&new, &ConversationLog::default(), "x")
            .system_context
            .contains("- distance (1 argument)"));
    }

    #[test]
    fn reload_rereads_profile_and_is_idempotent() {
        let a = ContextAssembler::new(Arc::new(CountingProfile(AtomicUsize::new(0))));
        assert_eq!(&*a.profile(), "profile v1");

        a.reload();
        let once = a.assemble(&registry(&["weather"]), &ConversationLog::default(), "x");
        assert!(once.system_context.starts_with("profile v2"));

        a.reload();
        let twice = a.assemble(&registry(&["weather"]), &ConversationLog::default(), "x");
        // Same shape; only the supplier's own counter moved.
        assert_eq!(
            twice.system_context.replace("v3", "v2"),
            once.system_context
        );
    }
}
