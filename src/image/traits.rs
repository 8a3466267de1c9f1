/// Read access to a row-major `(height, width, channels)` buffer.
///
/// A "row" is the `width * channels` interleaved samples of one scanline.
pub trait FeatureView {
    fn height(&self) -> usize;
    fn width(&self) -> usize;
    fn channels(&self) -> usize;

    fn row(&self, y: usize) -> &[f32];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height(), self.width(), self.channels())
    }

    fn pixel_count(&self) -> usize {
        self.height() * self.width()
    }
}

pub struct Rows<'a, I: ?Sized + FeatureView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: FeatureView> Iterator for Rows<'a, I> {
    type Item = &'a [f32];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.image.height().saturating_sub(self.y);
        (left, Some(left))
    }
}
