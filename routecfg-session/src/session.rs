//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! The session/apply facade (§C8): the single entry point external
//! callers (a CLI, a remote protocol handler, a configuration-file
//! loader) go through to change the live configuration. Owns the
//! configuration tree and drives it through parse, provisional merge,
//! and the two-pass commit engine, returning the structural delta and
//! deletion that callers broadcast to other interested parties.

use std::sync::Arc;

use chrono::Utc;

use routecfg_action::Dispatcher;
use routecfg_config::{ConfigTree, RenderOptions};
use routecfg_config::parser as config_parser;
use routecfg_modules::ModuleRegistry;
use routecfg_template::TemplateTree;

use crate::debug::Debug;
use crate::error::Error;

// What a successful `apply_change` or `delete_entire_configuration`
// produced: the structural delta and deletion to broadcast, plus which
// modules the commit actually touched.
#[derive(Clone, Debug, Default)]
pub struct ApplyOutcome {
    pub structural_delta: ConfigTree,
    pub structural_deletion: ConfigTree,
    pub modules_touched: Vec<String>,
}

// Owns the live configuration tree and runs it through the commit
// engine on the caller's behalf (§5: single-threaded, cooperative --
// the session never spawns its own task, it only awaits the dispatcher
// it is handed).
pub struct Session<D: Dispatcher + Send> {
    template: Arc<TemplateTree>,
    registry: Arc<ModuleRegistry>,
    config: ConfigTree,
    dispatcher: D,
    commit_in_progress: bool,
}

// ===== impl Session =====

impl<D: Dispatcher + Send> Session<D> {
    pub fn new(template: Arc<TemplateTree>, registry: Arc<ModuleRegistry>, dispatcher: D) -> Self {
        Session {
            template,
            registry,
            config: ConfigTree::new(),
            dispatcher,
            commit_in_progress: false,
        }
    }

    pub fn config(&self) -> &ConfigTree {
        &self.config
    }

    pub fn template(&self) -> &TemplateTree {
        &self.template
    }

    pub fn commit_in_progress(&self) -> bool {
        self.commit_in_progress
    }

    // Direct access to the dispatcher a caller handed to `new`, for
    // configuring or inspecting a test-only implementation (§10.4).
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }

    // Parses `deltas_text` and `deletions_text`, merges both
    // provisionally, refills defaults, then drives the two-pass commit.
    // On success, diffs the pre-change snapshot against the committed
    // result and returns what changed structurally; on any failure,
    // discards the provisional merge entirely (§4.8, §7).
    pub async fn apply_change(
        &mut self,
        user: u32,
        deltas_text: &str,
        deletions_text: &str,
    ) -> Result<ApplyOutcome, Error> {
        if self.commit_in_progress {
            return Err(Error::State("a commit is already in progress".to_string()));
        }
        Debug::ApplyChange(user).log();
        self.commit_in_progress = true;
        let result = self.apply_change_inner(user, deltas_text, deletions_text).await;
        self.commit_in_progress = false;

        if let Err(err) = &result {
            Debug::ApplyChangeRejected(user, &err.to_string()).log();
            self.config.discard_changes();
        }
        result
    }

    async fn apply_change_inner(
        &mut self,
        user: u32,
        deltas_text: &str,
        deletions_text: &str,
    ) -> Result<ApplyOutcome, Error> {
        let now = Utc::now();
        let before = self.config.clone();

        let delta = config_parser::parse(deltas_text, "<deltas>", &self.template)?;
        let deletion = config_parser::parse(deletions_text, "<deletions>", &self.template)?;

        self.config.merge_delta(&self.template, &[], &delta, 0, user, now, true)?;
        self.config.merge_deletion(&[], &deletion, user, now, true)?;
        self.config.add_default_children(&self.template, 0, user, now);

        let outcome = routecfg_commit::commit(&mut self.config, &self.template, &self.registry, &mut self.dispatcher).await?;

        let (structural_delta, structural_deletion) = before.diff(&self.config);
        Debug::ApplyChangeCommitted(user, count_nodes(&structural_delta), count_nodes(&structural_deletion)).log();
        Ok(ApplyOutcome {
            structural_delta,
            structural_deletion,
            modules_touched: outcome.modules_touched,
        })
    }

    // Computes the delta/deletion subtrees that move `self`'s committed
    // tree to `new_tree`, without applying anything (§4.8 `diff`).
    pub fn diff(&self, new_tree: &ConfigTree) -> (ConfigTree, ConfigTree) {
        self.config.diff(new_tree)
    }

    // Marks every node in the current tree for deletion and runs only
    // the apply pass -- no dry-run pre-check, since there is nothing
    // left to validate once the whole tree is gone (§4.8).
    pub async fn delete_entire_configuration(&mut self, user: u32) -> Result<ApplyOutcome, Error> {
        if self.commit_in_progress {
            return Err(Error::State("a commit is already in progress".to_string()));
        }
        Debug::DeleteEntireConfiguration(user).log();
        self.commit_in_progress = true;
        let result = self.delete_entire_configuration_inner(user).await;
        self.commit_in_progress = false;

        if let Err(err) = &result {
            Debug::ApplyChangeRejected(user, &err.to_string()).log();
            self.config.discard_changes();
        }
        result
    }

    async fn delete_entire_configuration_inner(&mut self, user: u32) -> Result<ApplyOutcome, Error> {
        let now = Utc::now();
        let before = self.config.clone();

        let deletion = self.config.retain_deletions(&ConfigTree::new());
        self.config.merge_deletion(&[], &deletion, user, now, true)?;

        let outcome =
            routecfg_commit::commit_apply_only(&mut self.config, &self.template, &self.registry, &mut self.dispatcher)
                .await?;

        let (structural_delta, structural_deletion) = before.diff(&self.config);
        Ok(ApplyOutcome {
            structural_delta,
            structural_deletion,
            modules_touched: outcome.modules_touched,
        })
    }

    // Renders the currently committed tree back out as configuration
    // text (§6, §11 `show_subtree`), for a save-to-file path.
    pub fn render(&self, options: RenderOptions) -> String {
        self.config.root().render(&self.template, options)
    }

    // Renders the whole committed tree as a complete configuration
    // file, header included (§6): `save -> load -> save` reproduces the
    // same file modulo the header's timestamp line.
    pub fn save(&self, host: &str, user: &str) -> String {
        routecfg_config::render::render_file(
            self.config.root(),
            &self.template,
            RenderOptions::default(),
            host,
            user,
            Utc::now(),
        )
    }
}

fn count_nodes(tree: &ConfigTree) -> usize {
    fn count(node: &routecfg_config::ConfigNode) -> usize {
        1 + node.children.iter().map(count).sum::<usize>()
    }
    tree.root().children.iter().map(count).sum()
}

#[cfg(test)]
mod tests {
    use routecfg_action::testing::FakeDispatcher;
    use routecfg_template::{TemplateNode, parser as tparser};

    use super::*;

    fn sample_template() -> Arc<TemplateTree> {
        let mut root = TemplateNode::new_void("", "");
        tparser::parse_into(
            r#"
            interfaces {
                interface @: txt {
                    %create: program "/bin/true";
                    mtu: u32 = 1500 {
                        %set: program "/bin/true";
                    };
                };
            };
            "#,
            "t.tp",
            &mut root,
        )
        .unwrap();
        Arc::new(TemplateTree::from_parsed_root(root).unwrap())
    }

    #[tokio::test]
    async fn apply_change_commits_and_reports_structural_delta() {
        let template = sample_template();
        let registry = Arc::new(ModuleRegistry::new());
        let mut session = Session::new(template, registry, FakeDispatcher::new());

        let outcome = session
            .apply_change(7, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
            .await
            .unwrap();

        assert!(!session.commit_in_progress());
        assert_eq!(count_nodes(&outcome.structural_delta), count_nodes(session.config()));
        let eth0 = session.config().find(&["interfaces", "eth0"]).unwrap();
        assert_eq!(eth0.state(), routecfg_config::NodeState::Clean);
    }

    #[tokio::test]
    async fn apply_change_rejects_while_commit_in_progress() {
        let template = sample_template();
        let registry = Arc::new(ModuleRegistry::new());
        let mut session = Session::new(template, registry, FakeDispatcher::new());
        session.commit_in_progress = true;

        let err = session.apply_change(7, "", "").await.unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[tokio::test]
    async fn delete_entire_configuration_clears_the_tree() {
        let template = sample_template();
        let registry = Arc::new(ModuleRegistry::new());
        let mut session = Session::new(template, registry, FakeDispatcher::new());
        session
            .apply_change(7, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
            .await
            .unwrap();

        session.delete_entire_configuration(9).await.unwrap();
        assert!(session.config().root().children.is_empty());
    }

    #[tokio::test]
    async fn malformed_delta_leaves_tree_untouched() {
        let template = sample_template();
        let registry = Arc::new(ModuleRegistry::new());
        let mut session = Session::new(template, registry, FakeDispatcher::new());

        let before = session.config().clone();
        let err = session.apply_change(7, "bogus: 1;", "").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(session.config().equals(&before, false));
    }

    #[tokio::test]
    async fn save_includes_the_xorp_header_and_committed_body() {
        let template = sample_template();
        let registry = Arc::new(ModuleRegistry::new());
        let mut session = Session::new(template, registry, FakeDispatcher::new());
        session
            .apply_change(7, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
            .await
            .unwrap();

        let saved = session.save("router1", "admin");
        assert!(saved.starts_with("/* XORP configuration file\n"));
        assert!(saved.contains("Configuration format: 1.1"));
        assert!(saved.contains("interface \"eth0\""));
    }
}
