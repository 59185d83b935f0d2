//! Cross-module scenarios run through the full import pipeline
