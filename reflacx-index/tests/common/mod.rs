//! Shared fixture: a miniature dataset tree on disk
//!
//! Layout:
//! ```text
//! reflacx/
//!   main_data/
//!     metadata_phase_1.csv   P1R1, P1R2 on d1 (kept); P1R3 on d2 (discarded)
//!     metadata_phase_2.csv   P2R1 on d3 (no discard column)
//!     P1R1/  fixations, transcription, timestamps, bounding box, ellipses
//!     P1R2/  fixations only
//!     P1R3/  transcription only
//!     P2R1/  transcription only
//!   heatmaps_phase_1/
//!     P1R1.npy.json   matches P1R1
//!     P9R9.npy.json   references an unknown image
//!     P1R7.npy.json   known image, unknown session
//! mimic/
//! ```
#![allow(dead_code)]

use ndarray::Array2;
use reflacx_index::services::heatmap::HeatmapArchive;
use reflacx_index::services::JsonHeatmapArchive;
use reflacx_index::IndexSources;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Image is 200 columns by 100 rows
pub const IMAGE_WIDTH: usize = 200;
pub const IMAGE_HEIGHT: usize = 100;

pub struct Dataset {
    pub root: TempDir,
}

impl Dataset {
    pub fn reflacx_dir(&self) -> PathBuf {
        self.root.path().join("reflacx")
    }

    pub fn mimic_dir(&self) -> PathBuf {
        self.root.path().join("mimic")
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.reflacx_dir().join("main_data").join(session_id)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.path().join("cache").join("metadata.json")
    }

    pub fn sources(&self) -> IndexSources {
        IndexSources::new(self.reflacx_dir(), self.mimic_dir())
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Gradient heatmap: value grows with row + column
pub fn gradient_heatmap() -> Array2<f64> {
    Array2::from_shape_fn((IMAGE_HEIGHT, IMAGE_WIDTH), |(r, c)| (r + c) as f64)
}

fn write_archive(path: &Path, img_path: &str, id: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let archive = HeatmapArchive {
        img_path: img_path.to_string(),
        id: id.to_string(),
        np_image: gradient_heatmap(),
    };
    JsonHeatmapArchive::write(path, &archive).unwrap();
}

pub fn dataset() -> Dataset {
    let root = TempDir::new().unwrap();
    let ds = Dataset { root };
    let main_data = ds.reflacx_dir().join("main_data");

    write(
        &main_data.join("metadata_phase_1.csv"),
        "id,dicom_id,image_size_x,image_size_y,eye_tracking_data_discarded,split\n\
         P1R1,d1,200,100,False,train\n\
         P1R2,d1,200,100,FALSE,test\n\
         P1R3,d2,200,100,True,train\n",
    );
    write(
        &main_data.join("metadata_phase_2.csv"),
        "id,dicom_id,image_size_x,image_size_y,split\n\
         P2R1,d3,200,100,val\n",
    );

    let p1r1 = ds.session_dir("P1R1");
    write(
        &p1r1.join("fixations.csv"),
        "timestamp_start_fixation,timestamp_end_fixation,x_position,y_position,pupil_area_normalized\n\
         0.5,0.8,10,10,0.9\n\
         1.1,1.9,50,40,1.0\n\
         2.2,2.5,-1,30,1.1\n\
         3.1,4.0,60,50,1.2\n\
         4.5,5.0,70,60,1.3\n",
    );
    write(&p1r1.join("transcription.txt"), "No effusion. Heart normal.\n");
    write(
        &p1r1.join("timestamps_transcription.csv"),
        "word,timestamp_start_word,timestamp_end_word\n\
         no,1.0,1.5\n\
         effusion,1.5,2.0\n\
         .,2.0,2.1\n\
         heart,3.0,3.5\n\
         normal,3.5,4.0\n\
         .,4.0,4.1\n",
    );
    write(
        &p1r1.join("chest_bounding_box.csv"),
        "xmin,ymin,xmax,ymax\n20,10,120,90\n",
    );
    write(
        &p1r1.join("anomaly_location_ellipses.csv"),
        "xmin,ymin,xmax,ymax,certainty,Atelectasis,Consolidation\n\
         30,20,80,60,4,True,False\n",
    );

    write(
        &ds.session_dir("P1R2").join("fixations.csv"),
        "timestamp_start_fixation,timestamp_end_fixation,x_position,y_position\n\
         0.0,1.0,5,5\n",
    );
    write(&ds.session_dir("P1R3").join("transcription.txt"), "Discarded.\n");
    write(&ds.session_dir("P2R1").join("transcription.txt"), "Lungs clear.\n");

    let heatmaps = ds.reflacx_dir().join("heatmaps_phase_1");
    write_archive(
        &heatmaps.join("P1R1.npy.json"),
        "/physionet/mimic/files/p10/d1.dcm",
        "P1R1",
    );
    write_archive(
        &heatmaps.join("P9R9.npy.json"),
        "/physionet/mimic/files/p10/d9.dcm",
        "P9R9",
    );
    write_archive(
        &heatmaps.join("P1R7.npy.json"),
        "/physionet/mimic/files/p10/d1.dcm",
        "P1R7",
    );

    fs::create_dir_all(ds.mimic_dir()).unwrap();
    ds
}
