//! SQL schema for the irdata SQLite store.
//!
//! Executed once at connection startup. The table and column names match the
//! [`Record`](irdata_core::record::Record) impls in `irdata-core`; inserts are
//! built from those, so a column renamed there must be renamed here too.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── State systems ──

-- COW and KSG state lists share one table, split by `system`.
CREATE TABLE IF NOT EXISTS states (
    system     TEXT    NOT NULL,   -- 'cow' | 'ksg'
    code       INTEGER NOT NULL,
    abbrev     TEXT    NOT NULL,
    name       TEXT    NOT NULL,
    microstate INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (system, code)
);

CREATE TABLE IF NOT EXISTS memberships (
    system     TEXT    NOT NULL,
    code       INTEGER NOT NULL,
    interval   INTEGER NOT NULL,
    start_date TEXT    NOT NULL,   -- YYYY-MM-DD
    end_date   TEXT    NOT NULL,
    PRIMARY KEY (system, code, interval),
    CHECK (start_date <= end_date)
);

CREATE TABLE IF NOT EXISTS cow_majors (
    ccode      INTEGER NOT NULL,
    interval   INTEGER NOT NULL,
    start_date TEXT    NOT NULL,
    end_date   TEXT    NOT NULL,
    PRIMARY KEY (ccode, interval),
    CHECK (start_date <= end_date)
);

CREATE TABLE IF NOT EXISTS system_years (
    system TEXT    NOT NULL,
    code   INTEGER NOT NULL,
    year   INTEGER NOT NULL,
    PRIMARY KEY (system, code, year)
);

CREATE VIEW IF NOT EXISTS cow_system AS
    SELECT code AS ccode, year FROM system_years WHERE system = 'cow';

CREATE VIEW IF NOT EXISTS ksg_system AS
    SELECT code AS ccode, year FROM system_years WHERE system = 'ksg';

-- ── Cross-system links ──

-- Either code may be NULL for a state with no counterpart.
CREATE TABLE IF NOT EXISTS ksg_to_cow (
    cow_ccode  INTEGER,
    ksg_ccode  INTEGER,
    start_date TEXT NOT NULL,
    end_date   TEXT NOT NULL,
    CHECK (cow_ccode IS NOT NULL OR ksg_ccode IS NOT NULL),
    CHECK (start_date <= end_date)
);

-- NULLs are distinct in a plain UNIQUE constraint, so fold them first.
CREATE UNIQUE INDEX IF NOT EXISTS ksg_to_cow_link_idx ON ksg_to_cow (
    IFNULL(cow_ccode, -1), IFNULL(ksg_ccode, -1), start_date, end_date
);

CREATE TABLE IF NOT EXISTS ksg_to_cow_year (
    cow_ccode  INTEGER,
    ksg_ccode  INTEGER,
    year       INTEGER NOT NULL,
    start_year INTEGER NOT NULL,
    end_year   INTEGER NOT NULL,
    mid_year   INTEGER NOT NULL,
    frac_year  REAL    NOT NULL,
    CHECK (frac_year > 0 AND frac_year <= 1)
);

CREATE INDEX IF NOT EXISTS ksg_to_cow_year_idx ON ksg_to_cow_year(year);

-- ── COW War Data v4 ──

CREATE TABLE IF NOT EXISTS war4 (
    war_num    INTEGER PRIMARY KEY,
    war_name   TEXT    NOT NULL,
    war_type   INTEGER NOT NULL,
    intnl      INTEGER,
    bat_deaths INTEGER
);

CREATE TABLE IF NOT EXISTS war4_sides (
    war_num   INTEGER NOT NULL REFERENCES war4(war_num),
    side      TEXT    NOT NULL,   -- 'a' | 'b'
    bat_death INTEGER,
    PRIMARY KEY (war_num, side)
);

CREATE TABLE IF NOT EXISTS war4_belligerents (
    belligerent      TEXT PRIMARY KEY,   -- '<ccode> <name>' or 'None <name>'
    belligerent_name TEXT NOT NULL,
    ccode            INTEGER
);

CREATE TABLE IF NOT EXISTS war4_partic (
    war_num      INTEGER NOT NULL,
    belligerent  TEXT    NOT NULL REFERENCES war4_belligerents(belligerent),
    occurrence   INTEGER NOT NULL,
    side         TEXT    NOT NULL,
    where_fought INTEGER,
    outcome      INTEGER,
    bat_death    INTEGER,
    initiator    INTEGER NOT NULL,
    PRIMARY KEY (war_num, belligerent, occurrence),
    FOREIGN KEY (war_num, side) REFERENCES war4_sides(war_num, side)
);

CREATE TABLE IF NOT EXISTS war4_partic_dates (
    war_num        INTEGER NOT NULL,
    belligerent    TEXT    NOT NULL,
    occurrence     INTEGER NOT NULL,
    partic_num     INTEGER NOT NULL,
    start_date_min TEXT,
    start_date_max TEXT,
    end_date_min   TEXT,
    end_date_max   TEXT,
    ongoing        INTEGER NOT NULL,
    PRIMARY KEY (war_num, belligerent, occurrence, partic_num),
    FOREIGN KEY (war_num, belligerent, occurrence)
        REFERENCES war4_partic(war_num, belligerent, occurrence)
);

-- ── COW War Data v3 ──

CREATE TABLE IF NOT EXISTS war3 (
    war_no    INTEGER PRIMARY KEY,
    war_type  INTEGER NOT NULL,
    war_name  TEXT    NOT NULL,
    deaths    INTEGER,
    edition   INTEGER,
    winner    INTEGER,
    non_state TEXT,
    state_num INTEGER
);

CREATE TABLE IF NOT EXISTS war3_dates (
    war_no       INTEGER NOT NULL,
    spell_no     INTEGER NOT NULL,
    date_beg_min TEXT,
    date_beg_max TEXT,
    date_end_min TEXT,
    date_end_max TEXT,
    PRIMARY KEY (war_no, spell_no)
);

CREATE TABLE IF NOT EXISTS war3_partic (
    war_no    INTEGER NOT NULL,
    state_num INTEGER NOT NULL,
    partic_no INTEGER NOT NULL,
    deaths    INTEGER,
    outcome   INTEGER,
    initiate  INTEGER,
    sys_stat  INTEGER,
    int_side  INTEGER,
    PRIMARY KEY (war_no, state_num, partic_no)
);

CREATE TABLE IF NOT EXISTS war3_partic_dates (
    war_no       INTEGER NOT NULL,
    state_num    INTEGER NOT NULL,
    partic_no    INTEGER NOT NULL,
    spell_no     INTEGER NOT NULL,
    date_beg_min TEXT,
    date_beg_max TEXT,
    date_end_min TEXT,
    date_end_max TEXT,
    PRIMARY KEY (war_no, state_num, partic_no, spell_no)
);

-- ── Militarized Interstate Disputes ──

CREATE TABLE IF NOT EXISTS mida (
    disp_num     INTEGER PRIMARY KEY,
    st_date_min  TEXT,
    st_date_max  TEXT,
    end_date_min TEXT,
    end_date_max TEXT,
    outcome      INTEGER,
    settle       INTEGER,
    fatality     INTEGER,
    hi_act       INTEGER,
    host_lev     INTEGER,
    num_a        INTEGER,
    num_b        INTEGER
);

CREATE TABLE IF NOT EXISTS mid_link_mid (
    disp_num_1 INTEGER NOT NULL,
    disp_num_2 INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS mid_link_war (
    disp_num INTEGER NOT NULL,
    war_num  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS midb (
    disp_num     INTEGER NOT NULL,
    ccode        INTEGER NOT NULL,
    spell_num    INTEGER NOT NULL,
    st_date_min  TEXT,
    st_date_max  TEXT,
    end_date_min TEXT,
    end_date_max TEXT,
    side_a       INTEGER,
    rev_state    INTEGER,
    fatality     INTEGER,
    hi_act       INTEGER,
    host_lev     INTEGER,
    orig         INTEGER,
    PRIMARY KEY (disp_num, ccode, spell_num)
);

-- ── Direct contiguity ──

CREATE TABLE IF NOT EXISTS contdir (
    statelno   INTEGER NOT NULL,
    statehno   INTEGER NOT NULL,
    start_date TEXT    NOT NULL,
    end_date   TEXT    NOT NULL,
    conttype   INTEGER NOT NULL,
    notes      TEXT,
    ongoing    INTEGER NOT NULL DEFAULT 0,
    CHECK (start_date <= end_date)
);

CREATE INDEX IF NOT EXISTS contdir_dyad_idx ON contdir(statelno, statehno);

-- ── Metadata ──

-- Value labels for coded columns, keyed by the table they describe.
CREATE TABLE IF NOT EXISTS factors (
    tbl   TEXT NOT NULL,
    value      NOT NULL,
    label TEXT NOT NULL,
    PRIMARY KEY (tbl, value)
);

CREATE TABLE IF NOT EXISTS load_runs (
    run_id      TEXT PRIMARY KEY,
    finished_at TEXT NOT NULL,   -- RFC 3339 UTC
    report      TEXT NOT NULL    -- JSON ReconcileReport
);

CREATE INDEX IF NOT EXISTS load_runs_finished_idx ON load_runs(finished_at);

PRAGMA user_version = 1;
";
