//! Crate-level integration and BDD tests.

use std::collections::BTreeMap;

use crate::codec::Json;
use crate::handle::{InvocationState, PluginHandle};

mod behaviour;

#[cfg(unix)]
#[test]
fn end_to_end_json_plugin() {
    let mut handle = PluginHandle::load_with_codec("/bin/sh", Json).expect("load");
    let input = BTreeMap::from([(String::from("a"), 1_u32), (String::from("b"), 2)]);
    let mut output: BTreeMap<String, u32> = BTreeMap::new();
    handle
        .invoke(
            &input,
            &mut output,
            &["-c", r#"cat >/dev/null; printf '{"total": 3}'"#],
        )
        .expect("invoke");
    assert_eq!(output, BTreeMap::from([(String::from("total"), 3)]));
    assert_eq!(handle.state(), InvocationState::Decoded);
}
