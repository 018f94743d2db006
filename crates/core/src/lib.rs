//! Face enrollment and nearest-descriptor classification.
//!
//! A [`Recognizer`](recognition::recognizer::Recognizer) keeps a dataset of
//! labeled face descriptors and answers "who is in this image?" by matching
//! each detected face against the closest enrolled sample.
//!
//! The recognizer is not internally synchronized. Share one between threads
//! by putting it behind a mutex:
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::{Arc, Mutex};
//!
//! use facematch_core::recognition::recognizer::Recognizer;
//! use facematch_core::recognition::recognizer_config::RecognizerConfig;
//!
//! let recognizer = Recognizer::from_models(None, RecognizerConfig::default(), None)?;
//! let shared = Arc::new(Mutex::new(recognizer));
//!
//! shared
//!     .lock()
//!     .unwrap()
//!     .add_image_to_dataset(Path::new("alice.jpg"), "alice")?;
//! let matches = shared.lock().unwrap().classify_multiple(Path::new("group.jpg"))?;
//! for face in matches {
//!     println!("{} at {:?}", face.label, face.rectangle);
//! }
//! # Ok::<(), facematch_core::shared::error::RecognizerError>(())
//! ```

pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod rectangle;
}

pub mod dataset {
    pub mod domain {
        pub mod dataset;
        pub mod descriptor;
        pub mod labeled_descriptor;
    }
    pub mod infrastructure {
        pub mod json_dataset_file;
    }
}

pub mod detection {
    pub mod domain {
        pub mod detected_face;
        pub mod detector_mode;
        pub mod face_detector;
        pub mod face_embedder;
        pub mod face_engine;
    }
    pub mod infrastructure;
}

pub mod matching {
    pub mod domain {
        pub mod classified_face;
        pub mod gallery;
        pub mod matcher;
    }
}

pub mod imaging {
    pub mod domain {
        pub mod image_source;
    }
    pub mod infrastructure {
        pub mod image_loader;
    }
}

pub mod recognition {
    pub mod recognizer;
    pub mod recognizer_config;
}
