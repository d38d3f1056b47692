use h5ad_alt_reader::h5ad::codec::buffer;
use h5ad_alt_reader::{DType, ElementKind, Endianness, H5adError, RawBuffer, TypedArray};

#[test]
fn decodes_big_endian_integers() {
    let dtype: DType = ">i4".parse().expect("valid descriptor");
    let raw = RawBuffer::new(dtype, vec![2], vec![0, 0, 0, 1, 0, 0, 1, 0]);

    let array = buffer::decode("counts", &raw).expect("decode");
    assert_eq!(array.element_name(), "int32");
    assert_eq!(array.to_index_vec(), Some(vec![1, 256]));
}

#[test]
fn keeps_declared_shape() {
    let raw = RawBuffer::from_f64(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).with_shape(&[2, 3]);
    let array = buffer::decode("obsm/X_pca", &raw).expect("decode");

    assert_eq!(array.shape(), &[2, 3]);
    assert_eq!(array.to_f64_vec(), Some(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
}

#[test]
fn rejects_buffer_size_mismatch() {
    let raw = RawBuffer::new(DType::element(ElementKind::Int(4)), vec![3], vec![0; 8]);
    let err = buffer::decode("obs/n_genes", &raw).unwrap_err();

    assert!(matches!(err, H5adError::Format { .. }), "got {err:?}");
    assert_eq!(err.path(), Some("obs/n_genes"));
}

#[test]
fn strips_nul_padding_from_byte_strings() {
    let raw = RawBuffer::from_byte_strings(5, &[b"ab", b"abcde"]);
    match buffer::decode("names", &raw).expect("decode") {
        TypedArray::Bytes { width, values } => {
            assert_eq!(width, 5);
            let values: Vec<Vec<u8>> = values.iter().cloned().collect();
            assert_eq!(values, vec![b"ab".to_vec(), b"abcde".to_vec()]);
        }
        other => panic!("expected bytes, got {other:?}"),
    }
}

#[test]
fn decodes_fixed_width_unicode() {
    let raw = RawBuffer::from_text(3, &["é", "abc"]);
    let array = buffer::decode("labels", &raw).expect("decode");
    assert_eq!(array.as_text(), Some(vec!["é", "abc"]));
}

#[test]
fn invalid_utf32_code_point_is_decode_error() {
    let dtype: DType = "<U1".parse().expect("valid descriptor");
    let raw = RawBuffer::new(dtype, vec![1], 0x0011_0000u32.to_le_bytes().to_vec());
    let err = buffer::decode("labels", &raw).unwrap_err();
    assert!(matches!(err, H5adError::Decode { .. }), "got {err:?}");
}

#[test]
fn decodes_packed_records_column_wise() {
    let raw = RawBuffer::pack_records(vec![
        ("name", RawBuffer::from_byte_strings(4, &[b"a", b"bb"])),
        ("score", RawBuffer::from_i16(&[-1, 7])),
    ])
    .expect("pack");
    assert_eq!(raw.dtype.itemsize(), 6);

    match buffer::decode("table", &raw).expect("decode") {
        TypedArray::Record(records) => {
            assert_eq!(records.len(), 2);
            assert_eq!(records.field_names().collect::<Vec<_>>(), vec!["name", "score"]);
            let score = records.field("score").expect("score column");
            assert_eq!(score.to_f64_vec(), Some(vec![-1.0, 7.0]));
        }
        other => panic!("expected records, got {other:?}"),
    }
}

#[test]
fn parses_and_prints_descriptors() {
    let dtype: DType = "|S10".parse().expect("valid descriptor");
    assert_eq!(dtype.to_string(), "|S10");
    assert_eq!("<U4".parse::<DType>().expect("valid").itemsize(), 16);
    assert_eq!(
        "<f8".parse::<DType>().expect("valid"),
        DType::Element {
            kind: ElementKind::Float(8),
            order: Endianness::Little,
        }
    );

    for bad in ["<i3", "<f2", "x4", "", "<b2", "|S0", "<U0"] {
        assert!(bad.parse::<DType>().is_err(), "accepted {bad:?}");
    }
}

#[test]
fn builds_record_dtype_from_descriptors() {
    let dtype = DType::record([("index", "|S8"), ("n_counts", "<f8")]).expect("record");
    assert!(dtype.is_record());
    assert_eq!(dtype.itemsize(), 16);
    assert!(DType::record(Vec::<(&str, &str)>::new()).is_err());
}

#[test]
fn overflowing_shape_is_format_error() {
    let dtype: DType = "<i4".parse().expect("valid descriptor");
    let raw = RawBuffer::new(dtype, vec![1 << 40, 1 << 40], vec![]);
    let err = buffer::decode("uns/huge", &raw).unwrap_err();

    assert!(matches!(err, H5adError::Format { .. }), "got {err:?}");
    assert_eq!(err.path(), Some("uns/huge"));
    assert_eq!(raw.element_count(), None);
}

#[test]
fn zero_width_elements_are_format_error() {
    let raw = RawBuffer::new(DType::element(ElementKind::Bytes(0)), vec![1 << 20], vec![]);
    let err = buffer::decode("uns/empty_names", &raw).unwrap_err();

    assert!(matches!(err, H5adError::Format { .. }), "got {err:?}");
    assert_eq!(err.path(), Some("uns/empty_names"));

    let empty = RawBuffer::new(DType::element(ElementKind::Bytes(0)), vec![0], vec![]);
    assert!(buffer::decode("uns/none", &empty).expect("decode").is_empty());
}
