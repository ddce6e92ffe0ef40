//! SQL schema for the catalog store.
//!
//! Applied at startup; every statement is idempotent.

/// DDL statements, executed in order
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS autores (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        nome  TEXT NOT NULL UNIQUE
    )
    "#,
    // 1:1 with autores; removed together with its author
    r#"
    CREATE TABLE IF NOT EXISTS perfis_autor (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        autor_id         INTEGER NOT NULL UNIQUE REFERENCES autores(id) ON DELETE CASCADE,
        biografia        TEXT,
        data_nascimento  TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categorias (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        nome  TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS livros (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        titulo    TEXT NOT NULL,
        ano       INTEGER,
        autor_id  INTEGER REFERENCES autores(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS livro_categorias (
        livro_id      INTEGER NOT NULL REFERENCES livros(id) ON DELETE CASCADE,
        categoria_id  INTEGER NOT NULL REFERENCES categorias(id) ON DELETE CASCADE,
        posicao       INTEGER NOT NULL,
        PRIMARY KEY (livro_id, categoria_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS usuarios (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT NOT NULL,
        email       TEXT NOT NULL UNIQUE,
        senha_hash  TEXT NOT NULL,
        criado_em   TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS livros_autor_idx ON livros(autor_id)",
    "CREATE INDEX IF NOT EXISTS livro_categorias_categoria_idx ON livro_categorias(categoria_id)",
];
