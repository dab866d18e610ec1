pub const SCHEMA: &str = r#"
-- Every container node. Row 0 is the implicit root that holds the
-- top-level buckets; it is never returned by a scan.
CREATE TABLE IF NOT EXISTS buckets (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER REFERENCES buckets(id) ON DELETE CASCADE,
    name TEXT NOT NULL,

    UNIQUE(parent_id, name)
);

-- Scalar key/value pairs owned by a bucket
CREATE TABLE IF NOT EXISTS fields (
    bucket_id INTEGER NOT NULL REFERENCES buckets(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (bucket_id, key)
);

INSERT OR IGNORE INTO buckets (id, parent_id, name) VALUES (0, NULL, '');

CREATE INDEX IF NOT EXISTS idx_buckets_parent ON buckets(parent_id, name);
"#;
