// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

// -- Recognized variants -------------------------------------------------------

#[test]
fn decodes_assign() -> anyhow::Result<()> {
    let env = decode(r##"{"type":"assign","id":"u42","color":"#112233"}"##)?;
    assert_eq!(env, Envelope::Assign { id: "u42".into(), color: "#112233".into() });
    Ok(())
}

#[test]
fn decodes_msg_with_null_recipient() -> anyhow::Result<()> {
    let env = decode(r##"{"type":"msg","from":"u1","text":"hi","color":"#fff","to":null}"##)?;
    assert_eq!(
        env,
        Envelope::Msg { from: "u1".into(), text: "hi".into(), color: "#fff".into(), to: None }
    );
    Ok(())
}

#[test]
fn decodes_upload_without_color() -> anyhow::Result<()> {
    let env = decode(
        r#"{"type":"upload","from":"system","url":"/uploads/1_2.png","filename":"a.png","to":null}"#,
    )?;
    let Envelope::Upload { color, filename, url, .. } = env else {
        anyhow::bail!("expected upload");
    };
    assert!(color.is_none());
    assert_eq!(filename, "a.png");
    assert_eq!(url, "/uploads/1_2.png");
    Ok(())
}

#[test]
fn decodes_help_without_commands() -> anyhow::Result<()> {
    let env = decode(r#"{"type":"help"}"#)?;
    assert_eq!(env, Envelope::Help { commands: vec![] });
    Ok(())
}

#[test]
fn decodes_whisper_with_recipient() -> anyhow::Result<()> {
    let env =
        decode(r##"{"type":"whisper","from":"u1","to":"u2","text":"psst","color":"#abc"}"##)?;
    assert_eq!(env.kind(), "whisper");
    Ok(())
}

#[test]
fn decodes_warn_and_banned() -> anyhow::Result<()> {
    assert_eq!(decode(r#"{"type":"warn","text":"slow down"}"#)?.kind(), "warn");
    assert_eq!(decode(r#"{"type":"banned","reason":"spam"}"#)?.kind(), "banned");
    Ok(())
}

// -- Forward compatibility -----------------------------------------------------

#[test]
fn unknown_type_is_not_an_error() -> anyhow::Result<()> {
    let env = decode(r#"{"type":"typing","from":"u1"}"#)?;
    assert_eq!(env, Envelope::Unknown);
    Ok(())
}

// -- Malformed payloads --------------------------------------------------------

#[test]
fn non_json_is_rejected() {
    let err = decode("hello there").err();
    assert!(matches!(err, Some(DecodeError::NotJson(_))));
}

#[test]
fn missing_type_is_rejected() {
    assert_eq!(decode(r#"{"text":"no tag"}"#).err(), Some(DecodeError::MissingType));
    assert_eq!(decode(r#"{"type":7}"#).err(), Some(DecodeError::MissingType));
    assert_eq!(decode("[1,2,3]").err(), Some(DecodeError::MissingType));
}

#[test]
fn wrong_shape_is_rejected_with_kind() -> anyhow::Result<()> {
    match decode(r#"{"type":"msg","from":"u1"}"#).err() {
        Some(DecodeError::InvalidFields { kind, .. }) => assert_eq!(kind, "msg"),
        other => anyhow::bail!("expected InvalidFields, got {other:?}"),
    }
    Ok(())
}
