//! Typed layer repositories over the SQLite project store.
//!
//! # Responsibility
//! - Map node / link / subcatchment rows to domain features and back.
//! - Provide the edit-session contract used by every batch operation: read
//!   the whole layer, mutate in memory, commit once.
//!
//! # Invariants
//! - Geometry is stored as JSON-encoded `geo` types in the `geometry` column.
//! - NULL text attributes read back as empty strings.
//! - Rows are listed in ascending `fid` order.

use crate::db::DbError;
use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::subcatchment::Subcatchment;
use crate::model::{Feature, FeatureId, LayerKind};
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Feature store error for layer access and persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Layer table is absent from the project store.
    MissingLayer(LayerKind),
    /// Layer table exists but lacks a required column.
    MissingColumn {
        layer: LayerKind,
        column: &'static str,
    },
    NotFound {
        layer: LayerKind,
        fid: FeatureId,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingLayer(layer) => write!(f, "{} layer not found", layer.label()),
            Self::MissingColumn { layer, column } => write!(
                f,
                "{} layer is missing required column `{column}`",
                layer.label()
            ),
            Self::NotFound { layer, fid } => {
                write!(f, "{} feature not found: fid={fid}", layer.label())
            }
            Self::InvalidData(message) => write!(f, "invalid persisted feature data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingLayer(_)
            | Self::MissingColumn { .. }
            | Self::NotFound { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Typed feature collection contract.
pub trait FeatureRepository<F> {
    /// Lists every feature of the layer in `fid` order.
    fn list_features(&self) -> RepoResult<Vec<F>>;
    fn get_feature(&self, fid: FeatureId) -> RepoResult<Option<F>>;
    /// Inserts a new feature and returns its store-assigned `fid`.
    ///
    /// The `fid` carried by `feature` is ignored.
    fn insert_feature(&self, feature: &F) -> RepoResult<FeatureId>;
    /// Writes back the attributes and geometry of existing features in one
    /// transaction.
    fn commit_features(&self, features: &[F]) -> RepoResult<()>;
}

/// Row mapping for a layer stored in the project database.
pub trait LayerRecord: Feature + Sized {
    /// Stored columns excluding `fid`, in `to_values` order.
    const COLUMNS: &'static [&'static str];

    fn to_values(&self) -> RepoResult<Vec<Value>>;
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// SQLite-backed repository for one layer.
pub struct SqliteFeatureRepository<'conn, F> {
    conn: &'conn Connection,
    _layer: PhantomData<F>,
}

pub type SqliteNodeRepository<'conn> = SqliteFeatureRepository<'conn, Node>;
pub type SqliteLinkRepository<'conn> = SqliteFeatureRepository<'conn, Link>;
pub type SqliteSubcatchmentRepository<'conn> = SqliteFeatureRepository<'conn, Subcatchment>;

impl<'conn, F: LayerRecord> SqliteFeatureRepository<'conn, F> {
    /// Creates a repository after checking that the layer table is usable.
    ///
    /// # Errors
    /// - `MissingLayer` when the table does not exist.
    /// - `MissingColumn` when the table lacks a mapped column.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_layer_ready(conn, F::LAYER, F::COLUMNS)?;
        Ok(Self {
            conn,
            _layer: PhantomData,
        })
    }

    fn select_sql() -> String {
        format!(
            "SELECT fid, {} FROM {}",
            F::COLUMNS.join(", "),
            F::LAYER.table_name()
        )
    }
}

impl<F: LayerRecord> FeatureRepository<F> for SqliteFeatureRepository<'_, F> {
    fn list_features(&self) -> RepoResult<Vec<F>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY fid ASC;", Self::select_sql()))?;
        let mut rows = stmt.query([])?;
        let mut features = Vec::new();
        while let Some(row) = rows.next()? {
            features.push(F::from_row(row)?);
        }
        Ok(features)
    }

    fn get_feature(&self, fid: FeatureId) -> RepoResult<Option<F>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE fid = ?1;", Self::select_sql()))?;
        let mut rows = stmt.query([fid])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(F::from_row(row)?));
        }
        Ok(None)
    }

    fn insert_feature(&self, feature: &F) -> RepoResult<FeatureId> {
        let placeholders = (1..=F::COLUMNS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                F::LAYER.table_name(),
                F::COLUMNS.join(", ")
            ),
            params_from_iter(feature.to_values()?),
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn commit_features(&self, features: &[F]) -> RepoResult<()> {
        let assignments = F::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE fid = ?{};",
            F::LAYER.table_name(),
            F::COLUMNS.len() + 1
        );

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for feature in features {
                let mut values = feature.to_values()?;
                values.push(Value::Integer(feature.fid()));
                if stmt.execute(params_from_iter(values))? == 0 {
                    error!(
                        "event=layer_commit module=repo status=error layer={} fid={} error_code=feature_not_found",
                        F::LAYER.table_name(),
                        feature.fid()
                    );
                    return Err(RepoError::NotFound {
                        layer: F::LAYER,
                        fid: feature.fid(),
                    });
                }
            }
        }
        tx.commit()?;

        debug!(
            "event=layer_commit module=repo status=ok layer={} features={}",
            F::LAYER.table_name(),
            features.len()
        );
        Ok(())
    }
}

impl LayerRecord for Node {
    const COLUMNS: &'static [&'static str] =
        &["id", "geometry", "invert_elev", "max_depth", "x", "y"];

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(self.id.clone()),
            Value::Text(encode_geometry(&self.position)?),
            real(self.invert_elev),
            real(self.max_depth),
            real(self.x),
            real(self.y),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            fid: row.get("fid")?,
            id: text(row, "id")?,
            position: decode_geometry(row, Self::LAYER)?,
            invert_elev: row.get("invert_elev")?,
            max_depth: row.get("max_depth")?,
            x: row.get("x")?,
            y: row.get("y")?,
        })
    }
}

impl LayerRecord for Link {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "geometry",
        "inlet_node",
        "outlet_node",
        "length",
        "manning_n",
        "in_offset",
        "out_offset",
    ];

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(self.id.clone()),
            Value::Text(encode_geometry(&self.path)?),
            Value::Text(self.inlet_node.clone()),
            Value::Text(self.outlet_node.clone()),
            real(self.length),
            real(self.manning_n),
            real(self.in_offset),
            real(self.out_offset),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            fid: row.get("fid")?,
            id: text(row, "id")?,
            path: decode_geometry(row, Self::LAYER)?,
            inlet_node: text(row, "inlet_node")?,
            outlet_node: text(row, "outlet_node")?,
            length: row.get("length")?,
            manning_n: row.get("manning_n")?,
            in_offset: row.get("in_offset")?,
            out_offset: row.get("out_offset")?,
        })
    }
}

impl LayerRecord for Subcatchment {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "geometry",
        "rain_gage",
        "outlet",
        "area",
        "perc_imperv",
        "width",
        "slope",
    ];

    fn to_values(&self) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(self.id.clone()),
            Value::Text(encode_geometry(&self.boundary)?),
            Value::Text(self.rain_gage.clone()),
            Value::Text(self.outlet.clone()),
            real(self.area),
            real(self.perc_imperv),
            real(self.width),
            real(self.slope),
        ])
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            fid: row.get("fid")?,
            id: text(row, "id")?,
            boundary: decode_geometry(row, Self::LAYER)?,
            rain_gage: text(row, "rain_gage")?,
            outlet: text(row, "outlet")?,
            area: row.get("area")?,
            perc_imperv: row.get("perc_imperv")?,
            width: row.get("width")?,
            slope: row.get("slope")?,
        })
    }
}

fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn text(row: &Row<'_>, column: &str) -> RepoResult<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn encode_geometry<G: Serialize>(geometry: &G) -> RepoResult<String> {
    serde_json::to_string(geometry)
        .map_err(|err| RepoError::InvalidData(format!("geometry encoding failed: {err}")))
}

fn decode_geometry<G: DeserializeOwned>(row: &Row<'_>, layer: LayerKind) -> RepoResult<G> {
    let raw: String = row.get("geometry")?;
    serde_json::from_str(&raw).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid geometry in {}.geometry: {err}",
            layer.table_name()
        ))
    })
}

fn ensure_layer_ready(
    conn: &Connection,
    layer: LayerKind,
    columns: &'static [&'static str],
) -> RepoResult<()> {
    let table = layer.table_name();
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingLayer(layer));
    }

    let present = table_columns(conn, table)?;
    for &column in std::iter::once(&"fid").chain(columns.iter()) {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingColumn { layer, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}
