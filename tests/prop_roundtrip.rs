//! Property tests: generated trees round-trip in both modes, and the
//! loader never panics on arbitrary input.

use proptest::prelude::*;

use lyra_chunk::{dump_to_vec, undump_bytes, Constant, LocalVar, Mode, Proto};

fn arb_constant() -> impl Strategy<Value = Constant> {
    prop_oneof![
        Just(Constant::Nil),
        any::<bool>().prop_map(Constant::Boolean),
        (-1.0e9..1.0e9f64).prop_map(Constant::Number),
        "[a-z0-9 ]{0,12}".prop_map(Constant::Str),
    ]
}

// Sources are always present so that content equality survives the
// parent-source elision on the wire.
fn arb_leaf() -> impl Strategy<Value = Proto> {
    (
        ("[a-z]{1,8}", 0i32..10_000, 0i32..10_000),
        (any::<u8>(), any::<u8>(), 0u8..=2, any::<u8>()),
        prop::collection::vec(any::<u32>(), 0..16),
        prop::collection::vec(arb_constant(), 0..8),
        prop::collection::vec(any::<i32>(), 0..16),
        prop::collection::vec(
            (prop::option::of("[a-z]{1,6}"), 0i32..100, 0i32..100),
            0..4,
        ),
        prop::collection::vec(prop::option::of("[a-z]{1,6}"), 0..4),
    )
        .prop_map(
            |(
                (source, line_defined, last_line_defined),
                (num_upvalues, num_params, is_vararg, max_stack_size),
                code,
                constants,
                line_info,
                locals,
                upvalue_names,
            )| {
                Proto {
                    source: Some(source),
                    line_defined,
                    last_line_defined,
                    num_upvalues,
                    num_params,
                    is_vararg,
                    max_stack_size,
                    code,
                    constants,
                    children: Vec::new(),
                    line_info,
                    local_vars: locals
                        .into_iter()
                        .map(|(name, start_pc, end_pc)| LocalVar {
                            name,
                            start_pc,
                            end_pc,
                        })
                        .collect(),
                    upvalue_names,
                }
            },
        )
}

fn arb_proto() -> impl Strategy<Value = Proto> {
    arb_leaf().prop_recursive(3, 16, 3, |inner| {
        (arb_leaf(), prop::collection::vec(inner, 0..3)).prop_map(|(mut f, children)| {
            f.children = children;
            f
        })
    })
}

proptest! {
    #[test]
    fn generated_trees_roundtrip_portable(tree in arb_proto()) {
        let bytes = dump_to_vec(&tree, Mode::Portable, false).expect("dump");
        let back = undump_bytes(&bytes, None).expect("undump");
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn generated_trees_roundtrip_native(tree in arb_proto()) {
        let bytes = dump_to_vec(&tree, Mode::Native, false).expect("dump");
        let back = undump_bytes(&bytes, None).expect("undump");
        prop_assert_eq!(back, tree);
    }

    #[test]
    fn stripped_dumps_always_decode_with_empty_debug(tree in arb_proto()) {
        let bytes = dump_to_vec(&tree, Mode::Portable, true).expect("dump");
        let back = undump_bytes(&bytes, None).expect("undump");
        prop_assert!(back.line_info.is_empty());
        prop_assert!(back.local_vars.is_empty());
        prop_assert!(back.upvalue_names.is_empty());
        prop_assert_eq!(back.code, tree.code);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn loader_never_panics_on_byte_soup(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        // Any input must produce Ok or Err, never a panic.
        let _ = undump_bytes(&bytes, None);
    }

    #[test]
    fn loader_never_panics_past_a_valid_header(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut bytes = dump_to_vec(&Proto::new(), Mode::Portable, false).expect("dump");
        bytes.truncate(lyra_chunk::HEADER_SIZE);
        bytes.extend_from_slice(&body);
        let _ = undump_bytes(&bytes, None);
    }
}
