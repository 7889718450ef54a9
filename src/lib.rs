/*!
# Data Sweeper

A file conversion utility for tabular data, built in Rust.

## Overview

Users upload CSV or Excel files, preview them, optionally remove duplicate
rows or fill missing numeric values with column means, pick the columns to
keep, look at a quick bar chart, and download the result as CSV or Excel.

## Architecture

Every uploaded file runs through the same stateless pipeline:

```text
parse -> (remove duplicates) -> (fill missing) -> select columns -> (chart) -> serialize
```

Each request re-runs the pipeline for the files it carries. Files never
share state, and a file that fails to load is reported and skipped
without affecting the others.

### Frontend Layer
- **Technologies**: a single HTML page with plain JavaScript
- Keeps the selected files in the browser and re-posts them on every change

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Loader - CSV (`csv`) and spreadsheet (`calamine`) ingestion with
    per-column type inference
  - Cleaning - duplicate removal and mean fill
  - Projection - column selection preserving row alignment
  - Downloader - CSV and XLSX (`rust_xlsxwriter`) export to memory
  - Graph - PNG bar charts of the first two numeric columns (`plotters`)

## Modules

- **frame**: Frame, Column and Value (the in-memory table) and column projection
- **cleaning**: Duplicate removal and missing-value fill
- **loader**: Format detection and parsing
- **downloader**: Conversion targets and export
- **pipeline**: Per-file processing
- **error**: Error taxonomy
- **config**: Server configuration
- **graph**: Chart generation (feature `web`)
- **app**: Routing and handlers (feature `web`)

## REST API Endpoints

- `GET /` - Landing page
- `GET /health` - Liveness check
- `POST /api/preview` - Parses uploads and returns a JSON preview per file
- `POST /api/convert` - Returns the converted file as an attachment
- `POST /api/chart` - Returns a PNG bar chart
*/

pub mod app;
pub mod cleaning;
pub mod config;
pub mod downloader;
pub mod error;
pub mod frame;
pub mod graph;
pub mod loader;
pub mod pipeline;

/// Re-export the types most callers need
pub use downloader::{ConversionTarget, Converted};
pub use error::{Result, SweeperError};
pub use frame::{Column, Frame, Value};
pub use pipeline::{PipelineOptions, UploadedFile};
