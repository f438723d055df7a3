//! Database schema definitions for cragbook.
//!
//! Table and column names match the existing climbing database so data can
//! be exchanged with it. Routes are referenced by their natural
//! (route, sector, crag) triple; composite foreign keys with
//! `ON DELETE CASCADE ON UPDATE CASCADE` keep those triples consistent.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Crags
CREATE TABLE IF NOT EXISTS crag (
    nom TEXT PRIMARY KEY NOT NULL,
    localitzacio TEXT,
    descripcio TEXT
);

-- Sectors, unique by name within a crag
CREATE TABLE IF NOT EXISTS sector (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nom TEXT NOT NULL,
    nom_crag TEXT NOT NULL
        REFERENCES crag(nom) ON DELETE CASCADE ON UPDATE CASCADE,
    descripcio TEXT,
    CONSTRAINT unique_sector_nom_crag UNIQUE (nom, nom_crag)
);

CREATE INDEX IF NOT EXISTS idx_sector_crag ON sector(nom_crag);

-- Routes, unique by name within a sector
CREATE TABLE IF NOT EXISTS via (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nom TEXT NOT NULL,
    nom_sector TEXT NOT NULL,
    nom_crag_sector TEXT NOT NULL,
    descripcio TEXT,
    grau_dificultat TEXT,
    estil TEXT,
    alcada_aproximada_metres INTEGER CHECK (alcada_aproximada_metres IS NULL OR alcada_aproximada_metres >= 0),
    equipador TEXT,
    data_equipament TEXT,
    CONSTRAINT unique_via_nom_sector_crag UNIQUE (nom, nom_sector, nom_crag_sector),
    FOREIGN KEY (nom_sector, nom_crag_sector)
        REFERENCES sector(nom, nom_crag) ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_via_sector ON via(nom_sector, nom_crag_sector);
CREATE INDEX IF NOT EXISTS idx_via_grau ON via(grau_dificultat);

-- Climbers (passwords are stored as entered)
CREATE TABLE IF NOT EXISTS escalador (
    nom_usuari TEXT PRIMARY KEY NOT NULL,
    contrasenya TEXT NOT NULL,
    data_naixement TEXT,
    nivell TEXT
);

-- Attempts
CREATE TABLE IF NOT EXISTS intent (
    id_intent INTEGER PRIMARY KEY AUTOINCREMENT,
    tipus_ascensio TEXT,
    data_intent TEXT NOT NULL,
    nom_usuari_escalador TEXT NOT NULL
        REFERENCES escalador(nom_usuari) ON DELETE CASCADE ON UPDATE CASCADE,
    nom_via TEXT NOT NULL,
    nom_sector_via TEXT NOT NULL,
    nom_crag_via TEXT NOT NULL,
    CONSTRAINT unique_intent_escalador_via_data_tipus
        UNIQUE (nom_usuari_escalador, nom_via, nom_sector_via, nom_crag_via, data_intent, tipus_ascensio),
    FOREIGN KEY (nom_via, nom_sector_via, nom_crag_via)
        REFERENCES via(nom, nom_sector, nom_crag_sector) ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_intent_escalador ON intent(nom_usuari_escalador);
CREATE INDEX IF NOT EXISTS idx_intent_via ON intent(nom_via, nom_sector_via, nom_crag_via);
CREATE INDEX IF NOT EXISTS idx_intent_data ON intent(data_intent);

-- Completions, one-to-one with attempts
CREATE TABLE IF NOT EXISTS encadenament (
    id_intent INTEGER PRIMARY KEY NOT NULL
        REFERENCES intent(id_intent) ON DELETE CASCADE,
    temps_ascensio TEXT
);

-- Comments
CREATE TABLE IF NOT EXISTS comentari (
    id_comentari INTEGER PRIMARY KEY AUTOINCREMENT,
    text_comentari TEXT NOT NULL,
    data_comentari TEXT NOT NULL,
    nom_usuari_escalador TEXT NOT NULL
        REFERENCES escalador(nom_usuari) ON DELETE CASCADE ON UPDATE CASCADE,
    nom_via TEXT NOT NULL,
    nom_sector_via TEXT NOT NULL,
    nom_crag_via TEXT NOT NULL,
    FOREIGN KEY (nom_via, nom_sector_via, nom_crag_via)
        REFERENCES via(nom, nom_sector, nom_crag_sector) ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comentari_escalador ON comentari(nom_usuari_escalador);
CREATE INDEX IF NOT EXISTS idx_comentari_via ON comentari(nom_via, nom_sector_via, nom_crag_via);

-- Recommendations, one per climber and route
CREATE TABLE IF NOT EXISTS recomanacio (
    id_recomanacio INTEGER PRIMARY KEY AUTOINCREMENT,
    puntuacio INTEGER NOT NULL CHECK (puntuacio BETWEEN 1 AND 5),
    descripcio_recomanacio TEXT,
    data_recomanacio TEXT NOT NULL,
    nom_usuari_escalador TEXT NOT NULL
        REFERENCES escalador(nom_usuari) ON DELETE CASCADE ON UPDATE CASCADE,
    nom_via TEXT NOT NULL,
    nom_sector_via TEXT NOT NULL,
    nom_crag_via TEXT NOT NULL,
    CONSTRAINT unique_recomanacio_escalador_via
        UNIQUE (nom_usuari_escalador, nom_via, nom_sector_via, nom_crag_via),
    FOREIGN KEY (nom_via, nom_sector_via, nom_crag_via)
        REFERENCES via(nom, nom_sector, nom_crag_sector) ON DELETE CASCADE ON UPDATE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_recomanacio_via ON recomanacio(nom_via, nom_sector_via, nom_crag_via);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// Tables created by [`SCHEMA`], parents before children.
pub const TABLES: [&str; 8] = [
    "crag",
    "sector",
    "via",
    "escalador",
    "intent",
    "encadenament",
    "comentari",
    "recomanacio",
];
