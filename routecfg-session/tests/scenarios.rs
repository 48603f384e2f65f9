//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

// End-to-end scenarios S1-S6 (spec §8), exercised only through the
// session facade's public API: `apply_change`, `config()`, `render`,
// plus `dispatcher()`/`dispatcher_mut()` to script and inspect the
// `FakeDispatcher` each test is built with.

use std::sync::Arc;

use routecfg_action::testing::{text_outcome, FakeDispatcher};
use routecfg_config::NodeState;
use routecfg_modules::ModuleRegistry;
use routecfg_session::Session;
use routecfg_template::{parser as tparser, TemplateNode, TemplateTree};

fn template(text: &str) -> Arc<TemplateTree> {
    let mut root = TemplateNode::new_void("", "");
    tparser::parse_into(text, "t.tp", &mut root).unwrap();
    Arc::new(TemplateTree::from_parsed_root(root).unwrap())
}

fn session(text: &str) -> Session<FakeDispatcher> {
    Session::new(template(text), Arc::new(ModuleRegistry::new()), FakeDispatcher::new())
}

// S1 -- create, commit, re-apply (no-op), modify, commit.
#[tokio::test]
async fn s1_create_commit_modify_commit() {
    let mut session = session(
        r#"
        interfaces {
            interface @: txt {
                %create: program "/bin/iface-create";
                mtu: u32 = 1500 {
                    %set: program "/bin/iface-set-mtu";
                    %update: program "/bin/iface-update";
                };
            };
        };
        "#,
    );

    session
        .apply_change(1, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
        .await
        .unwrap();
    assert_eq!(
        session.config().find(&["interfaces", "eth0"]).unwrap().state(),
        NodeState::Clean
    );
    assert!(session.dispatcher().calls.contains(&"/bin/iface-create".to_string()));
    assert!(session.dispatcher().calls.contains(&"/bin/iface-set-mtu".to_string()));

    // Re-applying the identical text commits zero further actions.
    let calls_before = session.dispatcher().calls.len();
    session
        .apply_change(1, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
        .await
        .unwrap();
    assert_eq!(session.dispatcher().calls.len(), calls_before);

    // Changing `mtu` fires `%set` and `%update`, but never `%create`
    // again -- the tag instance already exists.
    let creates_before = session
        .dispatcher()
        .calls
        .iter()
        .filter(|c| *c == "/bin/iface-create")
        .count();
    session
        .apply_change(1, r#"interfaces { interface "eth0" { mtu: 9000; }; };"#, "")
        .await
        .unwrap();
    let creates_after = session
        .dispatcher()
        .calls
        .iter()
        .filter(|c| *c == "/bin/iface-create")
        .count();
    assert_eq!(creates_before, creates_after);
    assert!(session.dispatcher().calls.contains(&"/bin/iface-update".to_string()));
}

// S2 -- deleting a tag instance short-circuits its children's own
// %delete commands.
#[tokio::test]
async fn s2_delete_short_circuits_children() {
    let mut session = session(
        r#"
        interfaces {
            interface @: txt {
                %create: program "/bin/iface-create";
                %delete: program "/bin/iface-delete";
                mtu: u32 = 1500 {
                    %set: program "/bin/iface-set-mtu";
                    %delete: program "/bin/mtu-delete";
                };
            };
        };
        "#,
    );

    session
        .apply_change(1, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
        .await
        .unwrap();

    session
        .apply_change(1, "", r#"interfaces { interface "eth0"; };"#)
        .await
        .unwrap();

    assert!(session.config().find(&["interfaces", "eth0"]).is_none());
    assert!(session.dispatcher().calls.contains(&"/bin/iface-delete".to_string()));
    assert!(!session.dispatcher().calls.contains(&"/bin/mtu-delete".to_string()));
}

// S3 -- a mandatory reference to an absent node fails Pass-1 before any
// action is dispatched.
#[tokio::test]
async fn s3_mandatory_reference_failure_aborts_before_dispatch() {
    let mut session = session(
        r#"
        protocols {
            ospf {
                router-id: ipv4;
                area @: ipv4 {
                    %create: program "/bin/area-create";
                    %mandatory "$(protocols.ospf.router-id)";
                };
            };
        };
        "#,
    );

    let err = session
        .apply_change(1, r#"protocols { ospf { area "0.0.0.1"; }; };"#, "")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        routecfg_session::Error::Commit(routecfg_commit::Error::Config(
            routecfg_config::Error::Reference(_)
        ))
    ));
    assert!(session.dispatcher().calls.is_empty());
    assert!(session.config().find(&["protocols", "ospf", "area"]).is_none());
}

// S4 -- a `sorted-numeric` order policy on a child leaf sorts the tag
// instances' dispatch order by that leaf's value.
#[tokio::test]
async fn s4_ordering_policy_sorts_create_dispatch() {
    let mut session = session(
        r#"
        routing {
            route @: ipv4net {
                %create: program "/bin/route-create";
                priority: u32 {
                    %order sorted-numeric;
                };
            };
        };
        "#,
    );

    session
        .apply_change(
            1,
            r#"
            routing {
                route "10.0.0.0/24" { priority: 30; };
                route "10.0.1.0/24" { priority: 10; };
                route "10.0.2.0/24" { priority: 20; };
            };
            "#,
            "",
        )
        .await
        .unwrap();

    // Three routes, each firing %create once per pass (dry-run + live).
    let creates = session
        .dispatcher()
        .calls
        .iter()
        .filter(|c| *c == "/bin/route-create")
        .count();
    assert_eq!(creates, 6);

    let rendered = session.render(routecfg_config::RenderOptions::default());
    let pos10 = rendered.find("10.0.1.0/24").unwrap();
    let pos20 = rendered.find("10.0.2.0/24").unwrap();
    let pos30 = rendered.find("10.0.0.0/24").unwrap();
    assert!(pos10 < pos20 && pos20 < pos30, "expected ascending priority order in render");
}

// S5 -- a leaf's captured return variable is readable as a named
// variable, and a later commit's action on that same node resolves
// $(@.key) against it.
#[tokio::test]
async fn s5_action_return_variable_is_captured_and_later_resolved() {
    let mut session = session(
        r#"
        interfaces {
            interface @: txt {
                %create: program "/bin/iface-create";
                mtu: u32 = 1500 {
                    %set: program "/usr/bin/genkey" -> stdout=key;
                    %update: program "/bin/use-key $(@.key)";
                };
            };
        };
        "#,
    );
    session
        .dispatcher_mut()
        .script_outcome("/usr/bin/genkey", text_outcome("key", "s3cr3t"));

    session
        .apply_change(1, r#"interfaces { interface "eth0" { mtu: 1400; }; };"#, "")
        .await
        .unwrap();

    let mtu = session.config().find(&["interfaces", "eth0", "mtu"]).unwrap();
    assert_eq!(
        mtu.variables.get("key"),
        Some(&routecfg_action::ReturnAtom::Text("s3cr3t".to_string()))
    );
    // %update did not fire on this first commit: mtu was New, not Modified.
    assert!(!session
        .dispatcher()
        .calls
        .iter()
        .any(|c| c.starts_with("/bin/use-key")));

    // Modifying mtu marks it Modified, firing %set (capturing `key`
    // again) and then %update, whose body resolves $(@.key) against the
    // value just captured on this same node.
    session
        .apply_change(1, r#"interfaces { interface "eth0" { mtu: 9000; }; };"#, "")
        .await
        .unwrap();
    assert!(session
        .dispatcher()
        .calls
        .iter()
        .any(|c| c == "/bin/use-key s3cr3t"));
}

// S6 -- a disallowed value on one leaf aborts Pass-1 before any
// dispatch happens, and the provisional merge is fully discarded.
#[tokio::test]
async fn s6_rollback_on_pass1_failure() {
    let mut session = session(
        r#"
        interfaces {
            interface @: txt {
                %create: program "/bin/iface-create";
                mtu: u32 {
                    %set: program "/bin/iface-set-mtu";
                    %allow-range [64..9216];
                };
                note: txt {
                    %set: program "/bin/iface-set-note";
                };
            };
        };
        "#,
    );

    let before = session.config().clone();
    let err = session
        .apply_change(
            1,
            r#"interfaces { interface "eth0" { mtu: 40; note: "ok"; }; };"#,
            "",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, routecfg_session::Error::Commit(_)));
    assert!(session.dispatcher().calls.is_empty());
    assert!(session.config().equals(&before, false));
}
