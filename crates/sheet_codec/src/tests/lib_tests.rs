use super::*;

fn text(s: &str) -> CellValue {
    CellValue::String(s.to_string())
}

fn sales_workbook() -> Workbook {
    Workbook::from_sheets(vec![
        Sheet::new(
            "Jan",
            vec![
                vec![text("Region"), text("Units"), text("Shipped")],
                vec![text("North"), CellValue::Number(120.0), CellValue::Bool(true)],
                vec![text("South"), CellValue::Number(87.5), CellValue::Bool(false)],
            ],
        ),
        Sheet::new(
            "Feb",
            vec![
                vec![text("Region"), text("Units")],
                vec![text("North"), CellValue::Number(-4.0)],
            ],
        ),
    ])
    .expect("workbook")
}

#[test]
fn empty_input_decodes_to_workbook_without_sheets() {
    let workbook = decode(&[]).expect("decode");
    assert!(workbook.is_empty());
    assert_eq!(workbook.sheet_names().count(), 0);
}

#[test]
fn garbage_bytes_are_a_format_error() {
    let err = decode(b"definitely not a spreadsheet").expect_err("must fail");
    assert!(matches!(err, FormatError::Container(_)), "unexpected error: {err}");
}

#[test]
fn invalid_base64_is_a_format_error() {
    let err = decode_base64("***not base64***").expect_err("must fail");
    assert!(matches!(err, FormatError::Base64(_)), "unexpected error: {err}");
}

#[test]
fn round_trip_keeps_sheet_order_names_and_values() {
    let original = sales_workbook();
    let bytes = encode(&original).expect("encode");
    let decoded = decode(&bytes).expect("decode");

    assert_eq!(decoded.sheet_names().collect::<Vec<_>>(), vec!["Jan", "Feb"]);
    assert_eq!(decoded, original);
    assert_eq!(
        decoded.sheet("Feb").expect("feb").rows[1][1],
        CellValue::Number(-4.0)
    );
}

#[test]
fn base64_round_trip_matches_byte_round_trip() {
    let bytes = encode(&sales_workbook()).expect("encode");
    let payload = encode_base64_bytes(&bytes);
    assert_eq!(decode_base64_bytes(&payload).expect("bytes"), bytes);
    assert_eq!(decode_base64(&payload).expect("decode"), sales_workbook());
}

#[test]
fn decoding_is_deterministic() {
    let bytes = encode(&sales_workbook()).expect("encode");
    let first = decode(&bytes).expect("first");
    let second = decode(&bytes).expect("second");
    assert_eq!(first, second);
}

#[test]
fn ragged_rows_are_not_padded() {
    let ragged = Workbook::from_sheets(vec![Sheet::new(
        "Notes",
        vec![
            vec![text("a"), CellValue::Empty, text("c")],
            vec![text("only")],
            vec![],
            vec![CellValue::Empty, CellValue::Number(3.0)],
        ],
    )])
    .expect("workbook");

    let decoded = decode(&encode(&ragged).expect("encode")).expect("decode");
    let rows = &decoded.sheet("Notes").expect("sheet").rows;
    let lengths: Vec<usize> = rows.iter().map(Vec::len).collect();
    assert_eq!(lengths, vec![3, 1, 0, 2]);
    assert_eq!(decoded, ragged);
}

#[test]
fn construction_stores_rows_in_canonical_form() {
    let sheet = Sheet::new(
        "Trailing",
        vec![
            vec![text("a"), CellValue::Empty],
            vec![text(""), text("b"), text("")],
            vec![],
            vec![CellValue::Empty],
        ],
    );
    assert_eq!(
        sheet.rows,
        vec![vec![text("a")], vec![CellValue::Empty, text("b")]]
    );
}

#[test]
fn trailing_blanks_and_empty_strings_survive_round_trip() {
    let workbook = Workbook::from_sheets(vec![
        Sheet::new(
            "Trailing",
            vec![vec![text("a"), CellValue::Empty], vec![text("b")], vec![]],
        ),
        Sheet::new("Blanks", vec![vec![text(""), text("x")]]),
    ])
    .expect("workbook");

    let decoded = decode(&encode(&workbook).expect("encode")).expect("decode");
    assert_eq!(decoded, workbook);
    assert_eq!(
        decoded.sheet("Blanks").expect("blanks").rows,
        vec![vec![CellValue::Empty, text("x")]]
    );
}

#[test]
fn rows_edited_after_construction_are_normalised_by_workbook() {
    let mut sheet = Sheet::new("Edited", vec![vec![text("a")]]);
    sheet.rows[0].push(text(""));
    sheet.rows.push(vec![CellValue::Empty]);

    let workbook = Workbook::from_sheets(vec![sheet]).expect("workbook");
    assert_eq!(workbook.sheet("Edited").expect("sheet").rows, vec![vec![text("a")]]);

    let decoded = decode(&encode(&workbook).expect("encode")).expect("decode");
    assert_eq!(decoded, workbook);
}

#[test]
fn grid_stays_anchored_at_first_cell() {
    let offset = Workbook::from_sheets(vec![Sheet::new(
        "Offset",
        vec![vec![], vec![CellValue::Empty, CellValue::Number(5.0)]],
    )])
    .expect("workbook");

    let decoded = decode(&encode(&offset).expect("encode")).expect("decode");
    assert_eq!(decoded, offset);
}

#[test]
fn sheet_without_cells_decodes_empty() {
    let blank = Workbook::from_sheets(vec![
        Sheet::new("Blank", Vec::new()),
        Sheet::new("Data", vec![vec![text("x")]]),
    ])
    .expect("workbook");

    let decoded = decode(&encode(&blank).expect("encode")).expect("decode");
    assert_eq!(decoded.sheet_names().collect::<Vec<_>>(), vec!["Blank", "Data"]);
    assert!(decoded.sheet("Blank").expect("blank").rows.is_empty());
}

#[test]
fn duplicate_sheet_names_are_rejected() {
    let err = Workbook::from_sheets(vec![Sheet::new("Same", Vec::new()), Sheet::new("Same", Vec::new())])
        .expect_err("must fail");
    assert!(matches!(err, FormatError::DuplicateSheet(name) if name == "Same"));
}

#[test]
fn encoding_an_empty_workbook_fails() {
    let err = encode(&Workbook::default()).expect_err("must fail");
    assert!(matches!(err, EncodeError::NoSheets));
}

#[test]
fn integral_numbers_display_without_fraction() {
    assert_eq!(CellValue::Number(42.0).to_string(), "42");
    assert_eq!(CellValue::Number(0.25).to_string(), "0.25");
    assert_eq!(CellValue::Empty.to_string(), "");
}
