use serde::{Deserialize, Serialize};

/// The `pg_num`/`pgp_num` variable an `osd pool set` command targets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PgVar {
    PgNum,
    PgpNum,
}

impl PgVar {
    pub fn as_str(&self) -> &'static str {
        match self {
            PgVar::PgNum => "pg_num",
            PgVar::PgpNum => "pgp_num",
        }
    }
}

/// A command issued to the monitors (spec §6.2). The command *transport* is
/// out of scope: this crate only builds the request and awaits a
/// [`crate::cluster_manager::CommandHandle`] for its completion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "prefix")]
pub enum MonCommand {
    #[serde(rename = "osd pool create")]
    OsdPoolCreate {
        pool: String,
        pg_num: u32,
        pgp_num: u32,
        pool_type: String,
        rule: String,
    },
    #[serde(rename = "osd pool set")]
    OsdPoolSet {
        pool: String,
        var: PgVar,
        val: u32,
    },
    #[serde(rename = "osd crush rule create-replicated")]
    OsdCrushRuleCreateReplicated {
        name: String,
        root: String,
        #[serde(rename = "type")]
        bucket_type: String,
        class: String,
    },
}
