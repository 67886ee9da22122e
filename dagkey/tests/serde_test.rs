//! Serde tests: handles serialize as their step keys

use std::collections::HashMap;

use dagkey::{DynamicStepHandle, NodePath, StaticStepHandle, StepHandle, UnresolvedStepHandle};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct StepRecord {
    step: StepHandle,
    template: UnresolvedStepHandle,
}

#[test]
fn test_handles_serialize_as_keys() -> Result<()> {
    let template = UnresolvedStepHandle::new(NodePath::parse("etl.load")?);
    let record = StepRecord {
        step: template.resolve("f1").into(),
        template: template.clone(),
    };

    let json = serde_json::to_string(&record)?;
    assert_eq!(json, r#"{"step":"etl.load[f1]","template":"etl.load[?]"}"#);
    assert_eq!(serde_json::from_str::<StepRecord>(&json)?, record);
    Ok(())
}

#[test]
fn test_wrong_kind_is_rejected() {
    let err = serde_json::from_str::<UnresolvedStepHandle>(r#""etl.load[f1]""#).unwrap_err();
    assert!(err.to_string().contains("expected unresolved step"));

    assert!(serde_json::from_str::<StaticStepHandle>(r#""etl.load[?]""#).is_err());
    assert!(serde_json::from_str::<DynamicStepHandle>(r#""etl.load""#).is_err());
    assert!(serde_json::from_str::<StepHandle>(r#""[?]""#).is_err());
}

#[test]
fn test_status_map_keyed_by_handle() -> Result<()> {
    let load = UnresolvedStepHandle::new(NodePath::parse("etl.load")?);
    let mut status: HashMap<StepHandle, &str> = HashMap::new();
    status.insert(StaticStepHandle::new(NodePath::parse("etl.extract")?).into(), "success");
    for key in ["f1", "f2"] {
        status.insert(load.resolve(key).into(), "running");
    }

    let json = serde_json::to_string(&status)?;
    let back: HashMap<StepHandle, String> = serde_json::from_str(&json)?;
    assert_eq!(back.len(), 3);
    assert_eq!(back[&StepHandle::from_key("etl.load[f2]")?], "running");
    Ok(())
}
