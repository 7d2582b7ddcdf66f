use crate::binning::AxisCollection;
use crate::error::{BinningError, SystematicError};
use crate::kernel::{Kernel, KernelPdf};
use crate::pdf::BinnedPdf;
use crate::representation::DataRepresentation;
use crate::systematic::{PdfMapping, SystematicEvaluator};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Detector-response smearing as a bin-to-bin transition matrix.
///
/// The kernel is a displacement density: for every ordered pair of bins in
/// the systematic's own (sub-)axes, the kernel is integrated over the
/// destination bin's edges offset by the origin bin's centre, answering
/// "what is the probability a true value in the origin bin is reconstructed
/// inside the destination bin". The reduced matrix is then replicated across
/// the full-dimensional binning using cached bin-compatibility groups: two
/// full bins communicate iff they agree on every axis the systematic does not
/// touch. The compatibility cache depends only on axis geometry, so it
/// survives parameter changes and is invalidated only on axis or
/// representation reassignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Convolution {
    kernel: Option<Kernel>,
    mapping: PdfMapping,
    has_axes: bool,
    representation: DataRepresentation,
    pdf_representation: DataRepresentation,
    // geometry-keyed caches, recomputed on demand when `cache_valid` is unset
    #[serde(skip)]
    sys_axes: AxisCollection,
    #[serde(skip)]
    sys_bins: Vec<usize>,
    #[serde(skip)]
    compatible_bins: Vec<Vec<usize>>,
    #[serde(skip)]
    cache_valid: bool,
}

impl Default for Convolution {
    fn default() -> Self {
        Self {
            kernel: None,
            mapping: PdfMapping::new(),
            has_axes: false,
            representation: DataRepresentation::default(),
            pdf_representation: DataRepresentation::default(),
            sys_axes: AxisCollection::new(),
            sys_bins: Vec::new(),
            compatible_bins: Vec::new(),
            cache_valid: false,
        }
    }
}

impl Convolution {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel: Some(kernel),
            ..Self::default()
        }
    }

    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.kernel = Some(kernel);
    }

    pub fn mapping(&self) -> &PdfMapping {
        &self.mapping
    }

    /// The compatibility partners of a full-dimensional bin, including the
    /// bin itself. Empty before the first `construct`.
    pub fn compatible_bins(&self, bin: usize) -> &[usize] {
        &self.compatible_bins[bin]
    }

    fn bins_compatible(&self, i: usize, j: usize, relative: &[usize]) -> bool {
        let axes = self.mapping.axes();
        (0..axes.n_dimensions())
            .filter(|dim| !relative.contains(dim))
            .all(|dim| axes.unflatten_index(i, dim) == axes.unflatten_index(j, dim))
    }

    fn cache_compatible_bins(&mut self) -> Result<(), SystematicError> {
        let relative = self
            .representation
            .relative_indices(&self.pdf_representation)?;
        let axes = self.mapping.axes().clone();
        let n_bins = axes.n_bins();

        // the axes this systematic acts on
        let mut sys_axes = AxisCollection::new();
        sys_axes
            .add_axes(relative.iter().map(|&dim| axes.axis(dim).clone()))
            .map_err(SystematicError::Binning)?;

        // symmetric relation: scan the upper triangle, record both directions.
        // every bin communicates with itself, so the diagonal is present and
        // an identity kernel reproduces the identity matrix.
        let mut compatible_bins: Vec<Vec<usize>> = (0..n_bins).map(|i| vec![i]).collect();
        for i in 0..n_bins {
            for j in (i + 1)..n_bins {
                if self.bins_compatible(i, j, &relative) {
                    compatible_bins[i].push(j);
                    compatible_bins[j].push(i);
                }
            }
        }

        // equivalent bin id inside the systematic's own binning
        let mut sys_bins = vec![0; n_bins];
        let mut sys_indices = vec![0; relative.len()];
        for (bin, slot) in sys_bins.iter_mut().enumerate() {
            for (index, &dim) in sys_indices.iter_mut().zip(relative.iter()) {
                *index = axes.unflatten_index(bin, dim);
            }
            *slot = sys_axes
                .flatten_indices(&sys_indices)
                .map_err(SystematicError::Binning)?;
        }

        self.sys_axes = sys_axes;
        self.sys_bins = sys_bins;
        self.compatible_bins = compatible_bins;
        self.cache_valid = true;
        Ok(())
    }
}

impl SystematicEvaluator for Convolution {
    fn set_axes(&mut self, axes: &AxisCollection) {
        self.mapping.set_axes(axes.clone());
        self.has_axes = true;
        self.cache_valid = false;
    }

    fn set_representations(&mut self, own: DataRepresentation, pdf: DataRepresentation) {
        self.representation = own;
        self.pdf_representation = pdf;
        self.cache_valid = false;
    }

    fn pdf_representation(&self) -> &DataRepresentation {
        &self.pdf_representation
    }

    fn parameter_count(&self) -> usize {
        self.kernel
            .as_ref()
            .map(|kernel| kernel.parameter_count())
            .unwrap_or(0)
    }

    fn parameters(&self) -> Vec<f64> {
        self.kernel
            .as_ref()
            .map(|kernel| kernel.parameters())
            .unwrap_or_default()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), SystematicError> {
        let kernel = self
            .kernel
            .as_mut()
            .ok_or(SystematicError::NotInitialised("kernel"))?;
        kernel.set_parameters(parameters)?;
        Ok(())
    }

    fn parameter(&self, index: usize) -> Result<f64, SystematicError> {
        let kernel = self
            .kernel
            .as_ref()
            .ok_or(SystematicError::NotInitialised("kernel"))?;
        Ok(kernel.parameter(index)?)
    }

    fn set_parameter(&mut self, index: usize, value: f64) -> Result<(), SystematicError> {
        let kernel = self
            .kernel
            .as_mut()
            .ok_or(SystematicError::NotInitialised("kernel"))?;
        kernel.set_parameter(index, value)?;
        Ok(())
    }

    fn construct(&mut self) -> Result<(), SystematicError> {
        if !self.has_axes {
            return Err(SystematicError::NotInitialised("axes"));
        }
        if self.kernel.is_none() {
            return Err(SystematicError::NotInitialised("kernel"));
        }
        if !self.cache_valid {
            self.cache_compatible_bins()?;
        }
        let Some(kernel) = self.kernel.as_ref() else {
            return Err(SystematicError::NotInitialised("kernel"));
        };

        // transition probabilities inside the systematic's own binning
        let n_sys_dims = self.sys_axes.n_dimensions();
        let n_sys_bins = self.sys_axes.n_bins();
        let mut centres = vec![0.0; n_sys_dims];
        let mut low_edges = vec![0.0; n_sys_dims];
        let mut high_edges = vec![0.0; n_sys_dims];
        let mut sub = Array2::zeros((n_sys_bins, n_sys_bins));
        for origin in 0..n_sys_bins {
            self.sys_axes.bin_centres(origin, &mut centres);
            for destination in 0..n_sys_bins {
                self.sys_axes.bin_low_edges(destination, &mut low_edges);
                self.sys_axes.bin_high_edges(destination, &mut high_edges);
                for dim in 0..n_sys_dims {
                    low_edges[dim] -= centres[dim];
                    high_edges[dim] -= centres[dim];
                }
                sub[[destination, origin]] = kernel.integral(&low_edges, &high_edges);
            }
        }

        // expand to the full binning; only cached-compatible pairs are nonzero
        let n_entries: usize = self.compatible_bins.iter().map(Vec::len).sum();
        let mut rows = Vec::with_capacity(n_entries);
        let mut cols = Vec::with_capacity(n_entries);
        let mut values = Vec::with_capacity(n_entries);
        for (origin, partners) in self.compatible_bins.iter().enumerate() {
            for &destination in partners {
                rows.push(origin);
                cols.push(destination);
                values.push(sub[[self.sys_bins[origin], self.sys_bins[destination]]]);
            }
        }
        self.mapping
            .set_triples(rows, cols, values)
            .map_err(SystematicError::Binning)
    }

    fn apply(&self, pdf: &BinnedPdf) -> Result<BinnedPdf, SystematicError> {
        if pdf.n_bins() != self.mapping.n_bins() {
            return Err(SystematicError::Binning(BinningError::DimensionMismatch {
                expected: self.mapping.n_bins(),
                actual: pdf.n_bins(),
            }));
        }
        let smeared = self
            .mapping
            .apply(pdf.contents())
            .map_err(SystematicError::Binning)?;
        let mut out = pdf.clone();
        out.set_contents(smeared).map_err(SystematicError::Binning)?;
        Ok(out)
    }
}
