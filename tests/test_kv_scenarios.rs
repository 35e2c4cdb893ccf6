
use fixtures::*;

use evtx_kv::{EvtxChunk, EventTables};
use pretty_assertions::assert_eq;

fn dump_chunk(chunk_bytes: &[u8], tables: &EventTables) -> String {
    let mut chunk = EvtxChunk::new(chunk_bytes).unwrap();
    let mut out = Vec::new();
    chunk.write_records(tables, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_empty_template_prints_only_the_prefix() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[], |body| {
            body.fragment_header();
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 \n");
}

#[test]
fn test_single_fixed_pair() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[], |body| {
            body.fragment_header();
            body.element_with_text("Computer", "HOST");
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 'Computer':'HOST', \n");
}

#[test]
fn test_event_data_name_synthesis() {
    ensure_env_logger_initialized();

    // <EventData><Data Name="X">%0</Data></EventData>
    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::U16(4624)], |body| {
            body.fragment_header();
            body.open_element("EventData");
            body.close_start();
            body.open_element_with_attrs("Data");
            body.attribute("Name");
            body.value_text("X");
            body.close_start();
            body.substitution(0, 0x06);
            body.close_element();
            body.close_element();
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::windows_defaults());

    // The Name attribute text becomes the key, and is itself suppressed.
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 'X':4624, \n");
}

#[test]
fn test_event_id_argument_annotation() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::U16(4624)], |body| {
            body.fragment_header();
            body.element_with_substitution("EventID", 0, 0x06);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::windows_defaults());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'EventID':4624 (An account was successfully logged on), \n"
    );
}

#[test]
fn test_event_id_fixed_pair_annotation() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[], |body| {
            body.fragment_header();
            body.element_with_text("EventID", "4625");
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::windows_defaults());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'EventID':4625 (An account failed to log on), \n"
    );

    // Without a matching table entry the pair stays literal.
    let bare = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(bare, "Record #1 2020.01.01-00:00:00 'EventID':'4625', \n");
}

#[test]
fn test_logon_type_annotation() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::U32(2)], |body| {
            body.fragment_header();
            body.element_with_substitution("LogonType", 0, 0x08);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::windows_defaults());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'LogonType':00000002 (Interactive), \n"
    );
}

#[test]
fn test_logon_type_without_label_prints_bare() {
    ensure_env_logger_initialized();

    // Index 6 has no label.
    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::U32(6)], |body| {
            body.fragment_header();
            body.element_with_substitution("LogonType", 0, 0x08);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::windows_defaults());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 'LogonType':00000006, \n");
}

#[test]
fn test_filetime_argument() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::FileTime(FILETIME_2020)], |body| {
            body.fragment_header();
            body.element_with_substitution("SystemTime", 0, 0x11);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'SystemTime':2020.01.01-00:00:00, \n"
    );
}

#[test]
fn test_filetime_argument_fallback_is_hex() {
    ensure_env_logger_initialized();

    // A pre-1970 FILETIME has no rendering and falls back to raw hex.
    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::FileTime(1)], |body| {
            body.fragment_header();
            body.element_with_substitution("SystemTime", 0, 0x11);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'SystemTime':0000000000000001, \n"
    );
}

#[test]
fn test_substitution_with_empty_name_stack_keeps_empty_key() {
    ensure_env_logger_initialized();

    // A placeholder with no surrounding element registers an empty key.
    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::U16(7)], |body| {
            body.fragment_header();
            body.substitution(0, 0x06);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 '':0007, \n");
}

#[test]
fn test_argument_types_render_with_documented_widths() {
    ensure_env_logger_initialized();

    let guid = [
        0x78, 0x56, 0x34, 0x12, 0x34, 0x12, 0x78, 0x56, 0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA,
        0xBE,
    ];
    let sid: &[u8] = &[0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x20, 0x00, 0x00, 0x00];

    let args = [
        ArgValue::String("alice"),
        ArgValue::U8(3),
        ArgValue::U64(5),
        ArgValue::Binary(&[0xDE, 0xAD]),
        ArgValue::Guid(guid),
        ArgValue::Sid(sid),
        ArgValue::Hex32(0xDEAD),
        ArgValue::Hex64(0xC0FFEE),
    ];

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &args, |body| {
            body.fragment_header();
            body.element_with_substitution("User", 0, 0x01);
            body.element_with_substitution("Level", 1, 0x04);
            body.element_with_substitution("Keywords", 2, 0x0a);
            body.element_with_substitution("Payload", 3, 0x0e);
            body.element_with_substitution("ProviderGuid", 4, 0x0f);
            body.element_with_substitution("UserSid", 5, 0x13);
            body.element_with_substitution("ProcessId", 6, 0x14);
            body.element_with_substitution("Mask", 7, 0x15);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 \
         'User':'alice', \
         'Level':03, \
         'Keywords':0000000000000005, \
         'Payload':DEAD, \
         'ProviderGuid':12345678-1234-5678-DEADBEEFCAFEBABE, \
         'UserSid':S-1-5-32, \
         'ProcessId':0000DEAD, \
         'Mask':0000000000C0FFEE, \n"
    );
}

#[test]
fn test_unknown_argument_type_emits_placeholder() {
    ensure_env_logger_initialized();

    let args = [
        ArgValue::Raw {
            type_code: 0x30,
            bytes: vec![0xAA, 0xBB, 0xCC],
        },
        ArgValue::U16(9),
    ];

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &args, |body| {
            body.fragment_header();
            body.element_with_substitution("Blob", 0, 0x06);
            body.element_with_substitution("Next", 1, 0x06);
            body.eof();
        });
        w.eof();
    });

    // The placeholder carries the declared type, the skip keeps the stream
    // aligned for the following argument.
    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'Blob':'...//0006[0003]', 'Next':0009, \n"
    );
}

#[test]
fn test_unreferenced_argument_is_skipped() {
    ensure_env_logger_initialized();

    let args = [ArgValue::String("ignored"), ArgValue::U16(4)];

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &args, |body| {
            body.fragment_header();
            // Only argument 1 has a placeholder.
            body.element_with_substitution("Count", 1, 0x06);
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 'Count':0004, \n");
}

#[test]
fn test_optional_substitution_rereads_zero_value_type() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::U16(11)], |body| {
            body.fragment_header();
            body.open_element("Qualifiers");
            body.close_start();
            body.optional_substitution(0, 0x06);
            body.close_element();
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 'Qualifiers':0011, \n");
}

#[test]
fn test_attribute_substitution_uses_attribute_name_as_key() {
    ensure_env_logger_initialized();

    // <TimeCreated SystemTime="%0"/>
    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[ArgValue::FileTime(FILETIME_2020)], |body| {
            body.fragment_header();
            body.open_element_with_attrs("TimeCreated");
            body.attribute("SystemTime");
            body.substitution(0, 0x11);
            body.close_empty();
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'SystemTime':2020.01.01-00:00:00, \n"
    );
}

#[test]
fn test_template_reuse_within_a_chunk() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder
        .add_record(1, FILETIME_2020, |w| {
            w.fragment_header();
            w.template_instance(0x10, &[ArgValue::U16(1)], |body| {
                body.fragment_header();
                body.element_with_text("Computer", "HOST");
                body.element_with_substitution("Counter", 0, 0x06);
                body.eof();
            });
            w.eof();
        })
        .add_record(2, FILETIME_2020, |w| {
            w.fragment_header();
            w.template_instance_cached(0x10, &[ArgValue::U16(2)]);
            w.eof();
        });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'Computer':'HOST', 'Counter':0001, \n\
         Record #2 2020.01.01-00:00:00 'Computer':'HOST', 'Counter':0002, \n"
    );
}

#[test]
fn test_nested_binxml_argument_emits_inner_instance() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder
        .add_record(1, FILETIME_2020, |w| {
            w.fragment_header();
            w.template_instance(0x10, &[ArgValue::U16(1)], |body| {
                body.fragment_header();
                body.element_with_substitution("InnerValue", 0, 0x06);
                body.eof();
            });
            w.eof();
        })
        .add_record(2, FILETIME_2020, |w| {
            // The outer template's single argument is a nested binxml
            // document holding a cached instance of template 0x10.
            let nested = cached_instance_bytes(0x10, &[ArgValue::U16(42)]);
            w.fragment_header();
            w.template_instance(0x20, &[ArgValue::BinXml(nested)], |body| {
                body.fragment_header();
                body.element_with_substitution("UserData", 0, 0x21);
                body.eof();
            });
            w.eof();
        });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'InnerValue':0001, \n\
         Record #2 2020.01.01-00:00:00 'InnerValue':0042, \n"
    );
}

#[test]
fn test_corrupt_nested_binxml_is_swallowed() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(
            0x10,
            &[
                ArgValue::BinXml(vec![0xEE, 0xEE]),
                ArgValue::U16(3),
            ],
            |body| {
                body.fragment_header();
                body.element_with_substitution("UserData", 0, 0x21);
                body.element_with_substitution("After", 1, 0x06);
                body.eof();
            },
        );
        w.eof();
    });

    // The invalid nested stream renders nothing; the outer cursor still
    // advances past it and the next argument decodes.
    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(output, "Record #1 2020.01.01-00:00:00 'After':0003, \n");
}

#[test]
fn test_duplicate_fixed_pairs_are_kept_in_order() {
    ensure_env_logger_initialized();

    let mut builder = ChunkBuilder::new();
    builder.add_record(1, FILETIME_2020, |w| {
        w.fragment_header();
        w.template_instance(0x10, &[], |body| {
            body.fragment_header();
            body.element_with_text("Channel", "Security");
            body.element_with_text("Channel", "System");
            body.eof();
        });
        w.eof();
    });

    let output = dump_chunk(&builder.build(), &EventTables::empty());
    assert_eq!(
        output,
        "Record #1 2020.01.01-00:00:00 'Channel':'Security', 'Channel':'System', \n"
    );
}
