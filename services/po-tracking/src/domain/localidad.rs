//! 网点/地点目录（localidades）

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::values::value_to_text;

pub const LOCALIDADES_TABLE: &str = "localidades";

/// 已保存的地点
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Localidad {
    pub id: i32,
    pub taller: String,
    pub localidad: String,
    #[serde(rename = "CODIGO")]
    pub codigo: Option<String>,
    #[serde(rename = "NOMBRE COMPAQ")]
    pub nombre_compaq: Option<String>,
    #[serde(rename = "NOMENCLATURA")]
    pub nomenclatura: Option<String>,
}

/// 上传或编辑时的地点数据
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalidadInput {
    #[serde(default)]
    pub taller: Value,
    #[serde(default)]
    pub localidad: Value,
    #[serde(default)]
    pub codigo: Value,
    #[serde(default)]
    pub nombre_compaq: Value,
    #[serde(default)]
    pub nomenclatura: Value,
}

/// 校验后的地点数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocalidad {
    pub taller: String,
    pub localidad: String,
    pub codigo: Option<String>,
    pub nombre_compaq: Option<String>,
    pub nomenclatura: Option<String>,
}

impl LocalidadInput {
    /// taller 与 localidad 均不能为空
    pub fn validate(&self) -> Option<NewLocalidad> {
        let taller = required_text(&self.taller)?;
        let localidad = required_text(&self.localidad)?;

        Some(NewLocalidad {
            taller,
            localidad,
            codigo: value_to_text(&self.codigo),
            nombre_compaq: value_to_text(&self.nombre_compaq),
            nomenclatura: value_to_text(&self.nomenclatura),
        })
    }
}

fn required_text(value: &Value) -> Option<String> {
    value_to_text(value).filter(|text| !text.is_empty())
}
