use h5ad_alt_reader::h5ad::codec::buffer;
use h5ad_alt_reader::h5ad::format::postprocess::{Postprocessor, postprocess};
use h5ad_alt_reader::{H5adError, Literal, RawBuffer, ReadOptions, Scalar, TypedArray, Value};

fn array(path: &str, raw: RawBuffer) -> Value {
    Value::Array(buffer::decode(path, &raw).expect("decode"))
}

fn name_table(width: usize, names: &[&[u8]]) -> RawBuffer {
    let ids: Vec<i32> = (0..names.len() as i32).collect();
    RawBuffer::pack_records(vec![
        ("name", RawBuffer::from_byte_strings(width, names)),
        ("id", RawBuffer::from_i32(&ids)),
    ])
    .expect("pack")
}

#[test]
fn unwraps_single_element_arrays() {
    let raw = RawBuffer::from_i64(&[50]);
    let (key, value) = postprocess("uns/n_pcs", "n_pcs", array("uns/n_pcs", raw)).expect("postprocess");
    assert_eq!(key, "n_pcs");
    assert_eq!(value, Value::Scalar(Scalar::I64(50)));
}

#[test]
fn leaves_other_shapes_alone() {
    let two_d = array("m", RawBuffer::from_i64(&[5]).with_shape(&[1, 1]));
    let (_, value) = postprocess("m", "m", two_d.clone()).expect("postprocess");
    assert_eq!(value, two_d);

    let many = array("v", RawBuffer::from_f32(&[1.0, 2.0]));
    let (_, value) = postprocess("v", "v", many.clone()).expect("postprocess");
    assert_eq!(value, many);
}

#[test]
fn applying_twice_matches_applying_once() {
    for raw in [
        RawBuffer::from_f64(&[0.5]),
        RawBuffer::from_byte_strings(8, &[b"{'a': 1}"]),
        RawBuffer::from_byte_strings(4, &[b"x", b"yz"]),
        name_table(8, &[b"abcdefgh"]),
    ] {
        let (_, once) = postprocess("k", "k", array("k", raw)).expect("first pass");
        let (_, twice) = postprocess("k", "k", once.clone()).expect("second pass");
        assert_eq!(once, twice);
    }
}

#[test]
fn decodes_byte_string_arrays() {
    let (_, value) = postprocess("cats", "cats", array("cats", RawBuffer::from_byte_strings(4, &[b"ab", b"cd"])))
        .expect("postprocess");
    let text = value.as_array().and_then(TypedArray::as_text);
    assert_eq!(text, Some(vec!["ab", "cd"]));
}

#[test]
fn recovers_dictionary_strings() {
    let raw = RawBuffer::from_byte_strings(8, &[b"{'a': 1}"]);
    let (key, value) = postprocess("uns/params", "params", array("uns/params", raw)).expect("postprocess");

    assert_eq!(key, "params");
    let literal = value.as_literal().expect("literal");
    assert_eq!(literal, &Literal::Dict(vec![(Literal::Str("a".into()), Literal::Int(1))]));
    assert_eq!(literal.get("a"), Some(&Literal::Int(1)));
}

#[test]
fn malformed_dictionary_string_is_decode_error() {
    let raw = RawBuffer::from_byte_strings(8, &[b"{'a': }"]);
    let err = postprocess("uns/params", "params", array("uns/params", raw)).unwrap_err();
    assert!(matches!(err, H5adError::Decode { .. }), "got {err:?}");
    assert_eq!(err.path(), Some("uns/params"));
}

#[test]
fn dictionary_recovery_can_be_disabled() {
    let options = ReadOptions::default().with_recover_dict_strings(false);
    let raw = RawBuffer::from_byte_strings(8, &[b"{'a': 1}"]);
    let (_, value) = Postprocessor::new(&options)
        .apply("uns/params", "params", array("uns/params", raw))
        .expect("postprocess");
    assert_eq!(value, Value::Scalar(Scalar::Text("{'a': 1}".into())));
}

#[test]
fn unicode_text_is_never_parsed_as_dictionary() {
    let raw = RawBuffer::from_text(8, &["{'a': 1}"]);
    let (_, value) = postprocess("uns/note", "note", array("uns/note", raw)).expect("postprocess");
    assert_eq!(value, Value::Scalar(Scalar::Text("{'a': 1}".into())));
}

#[test]
fn invalid_utf8_is_decode_error() {
    let raw = RawBuffer::from_byte_strings(2, &[&[0xff, 0xfe]]);
    let err = postprocess("uns/bad", "bad", array("uns/bad", raw)).unwrap_err();
    assert!(matches!(err, H5adError::Decode { .. }), "got {err:?}");
}

#[test]
fn retypes_byte_fields_to_quarter_width_text() {
    let table = array("uns/table", name_table(8, &[b"abcdefgh", b"xy"]));
    let (_, value) = postprocess("uns/table", "table", table).expect("postprocess");

    let Some(TypedArray::Record(records)) = value.as_array() else {
        panic!("expected a record array, got {value:?}");
    };
    match records.field("name") {
        Some(TypedArray::Text { width, .. }) => assert_eq!(*width, 2),
        other => panic!("expected a text field, got {other:?}"),
    }
    assert_eq!(
        records.field("name").and_then(TypedArray::as_text),
        Some(vec!["ab", "xy"])
    );
    assert_eq!(records.field("id").map(TypedArray::element_name), Some("int32"));
}

#[test]
fn byte_fields_narrower_than_four_bytes_become_empty_text() {
    let table = array("t", name_table(3, &[b"abc", b"d"]));
    let (_, value) = postprocess("t", "t", table).expect("postprocess");

    let Some(TypedArray::Record(records)) = value.as_array() else {
        panic!("expected a record array, got {value:?}");
    };
    assert!(matches!(records.field("name"), Some(TypedArray::Text { width: 0, .. })));
    assert_eq!(records.field("name").and_then(TypedArray::as_text), Some(vec!["", ""]));
}

#[test]
fn annotation_tables_keep_byte_fields() {
    for key in ["obs", "_obs", "smp", "_smp", "var", "_var", "raw.var"] {
        let table = array(key, name_table(8, &[b"cell_a", b"cell_b"]));
        let (_, value) = postprocess(key, key, table).expect("postprocess");

        let Some(TypedArray::Record(records)) = value.as_array() else {
            panic!("expected a record array under {key}");
        };
        assert!(
            matches!(records.field("name"), Some(TypedArray::Bytes { width: 8, .. })),
            "{key} lost its byte field"
        );
    }
}
