//! Testing utilities for scopewire workspace
//!
//! Shared declaration fixtures used across crates.

#![allow(missing_docs)]

use scopewire_model::{Contract, Declarations, ScopeDecl, Value};

pub fn contract(name: &str, values: &[(&str, &str)]) -> Contract {
    Contract::new(
        name,
        values
            .iter()
            .map(|(value, type_name)| Value::new(*value, *type_name))
            .collect(),
    )
    .expect("fixture contract must be valid")
}

/// Root → LoggedIn → Game → ScoreSheet, plus LoggedIn → ScoreSheet
///
/// - `Root` supplies `playersStream`
/// - `LoggedIn` supplies `scoreStream`
/// - `Game` requires `scoreStream` and `playersStream`
/// - `ScoreSheet` requires `scoreStream` and is reached twice
pub fn game_scenario() -> Declarations {
    Declarations::new()
        .with_contract(contract(
            "GameDependency",
            &[("scoreStream", "ScoreStream"), ("playersStream", "PlayersStream")],
        ))
        .with_contract(contract("ScoreSheetDependency", &[("scoreStream", "ScoreStream")]))
        .with_scope(
            ScopeDecl::root("Root")
                .supplying("playersStream", "PlayersStream")
                .with_child("LoggedIn"),
        )
        .with_scope(
            ScopeDecl::new("LoggedIn")
                .supplying("scoreStream", "ScoreStream")
                .with_child("Game")
                .with_child("ScoreSheet"),
        )
        .with_scope(
            ScopeDecl::new("Game")
                .with_contract("GameDependency")
                .with_child("ScoreSheet"),
        )
        .with_scope(ScopeDecl::new("ScoreSheet").with_contract("ScoreSheetDependency"))
}

/// Pluginized `Checkout` with companion `CheckoutNonCore`
///
/// - `Root` supplies `session`
/// - `Checkout` exposes `cart` through `CheckoutPluginExtension`
/// - `CheckoutNonCore` supplies `cart` and requires `session`
/// - `Payment`, a child of `Checkout`, requires `cart` and `session`
pub fn plugin_scenario() -> Declarations {
    Declarations::new()
        .with_contract(contract(
            "PaymentDependency",
            &[("cart", "Cart"), ("session", "Session")],
        ))
        .with_contract(contract("CheckoutNonCoreDependency", &[("session", "Session")]))
        .with_scope(
            ScopeDecl::root("Root")
                .supplying("session", "Session")
                .with_child("Checkout"),
        )
        .with_scope(
            ScopeDecl::new("Checkout")
                .with_child("Payment")
                .with_plugin("CheckoutNonCore", "CheckoutPluginExtension"),
        )
        .with_scope(ScopeDecl::new("Payment").with_contract("PaymentDependency"))
        .with_companion(
            ScopeDecl::new("CheckoutNonCore")
                .with_contract("CheckoutNonCoreDependency")
                .supplying("cart", "Cart"),
        )
        .with_extension(contract("CheckoutPluginExtension", &[("cart", "Cart")]))
}

/// Owner supplies `token`, companion requires it, extension exposes it
pub fn cyclic_plugin_scenario() -> Declarations {
    Declarations::new()
        .with_contract(contract("VaultNonCoreDependency", &[("token", "Token")]))
        .with_scope(ScopeDecl::root("Root").with_child("Vault"))
        .with_scope(
            ScopeDecl::new("Vault")
                .supplying("token", "Token")
                .with_plugin("VaultNonCore", "VaultPluginExtension"),
        )
        .with_companion(
            ScopeDecl::new("VaultNonCore")
                .with_contract("VaultNonCoreDependency")
                .supplying("token", "Token"),
        )
        .with_extension(contract("VaultPluginExtension", &[("token", "Token")]))
}

/// Linear chain `S0 → S1 → … → S{depth}`
///
/// Every scope listed in `suppliers` supplies `item: Item`; the last scope
/// requires it.
pub fn chain(depth: usize, suppliers: &[usize]) -> Declarations {
    let mut decls = Declarations::new().with_contract(contract("LeafDependency", &[("item", "Item")]));
    for index in 0..=depth {
        let name = format!("S{index}");
        let mut decl = if index == 0 {
            ScopeDecl::root(name)
        } else {
            ScopeDecl::new(name)
        };
        if index < depth {
            decl = decl.with_child(format!("S{}", index + 1));
        } else {
            decl = decl.with_contract("LeafDependency");
        }
        if suppliers.contains(&index) {
            decl = decl.supplying("item", "Item");
        }
        decls = decls.with_scope(decl);
    }
    decls
}
